// src/core/types.rs
use std::path::PathBuf;

/// A distinct token string of the corpus with the statistics used to rank it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordType {
    pub text: String,
    /// Length in characters.
    pub length: usize,
    /// Number of tokens of this type in the filtered token stream.
    pub count: usize,
}

impl WordType {
    /// Longer and more frequent words are reviewed first.
    pub fn priority(&self) -> usize {
        self.length + self.count
    }
}

/// A candidate word and its similarity to the anchor it was ranked against.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityPair {
    pub word: String,
    /// In `[0, 1]`; 1.0 means identical.
    pub ratio: f64,
}

/// Word types grouped as likely spelling variants of each other.
/// The anchor, the member that formed the cluster, is stored last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCluster {
    members: Vec<WordType>,
}

impl WordCluster {
    pub(crate) fn new(alternatives: Vec<WordType>, anchor: WordType) -> Self {
        let mut members = alternatives;
        members.push(anchor);
        Self { members }
    }

    pub fn anchor(&self) -> &WordType {
        // Never empty: `new` always pushes the anchor.
        &self.members[self.members.len() - 1]
    }

    pub fn members(&self) -> &[WordType] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.members.iter().any(|m| m.text == word)
    }
}

/// One concrete appearance of a word in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Zero-based position in the worklist, corpus-wide.
    pub sequence: usize,
    pub file: PathBuf,
    /// Zero-based interval index within `file`.
    pub interval: usize,
    /// Zero-based index among the tokens of the interval equal to the word.
    pub instance: usize,
}

/// Every occurrence of one word, in corpus order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worklist {
    word: String,
    occurrences: Vec<Occurrence>,
}

impl Worklist {
    pub(crate) fn new(word: String, occurrences: Vec<Occurrence>) -> Self {
        Self { word, occurrences }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn get(&self, index: usize) -> Option<&Occurrence> {
        self.occurrences.get(index)
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Occurrence> {
        self.occurrences.iter()
    }
}
