// File: src/core/vocabulary.rs
use crate::config::TokenFilter;
use crate::core::types::WordType;
use crate::corpus::CorpusAccessor;
use crate::error::Result;
use log::{info, warn};
use std::collections::BTreeMap;

/// Token counts and lengths of a corpus. Maps are ordered so every
/// iteration over the vocabulary is deterministic.
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    counts: BTreeMap<String, usize>,
    /// Only types strictly longer than the minimum length.
    lengths: BTreeMap<String, usize>,
}

impl VocabularyIndex {
    pub fn build<I, S>(tokens: I, min_length: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for token in tokens {
            *counts.entry(token.into()).or_insert(0) += 1;
        }
        let lengths = counts
            .keys()
            .map(|w| (w, w.chars().count()))
            .filter(|&(_, len)| len > min_length)
            .map(|(w, len)| (w.clone(), len))
            .collect();
        Self { counts, lengths }
    }

    pub fn count(&self, word: &str) -> usize {
        self.counts.get(word).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    /// Whether `word` is a reviewable type (passes the length filter).
    pub fn contains_type(&self, word: &str) -> bool {
        self.lengths.contains_key(word)
    }

    /// Reviewable types in sorted order.
    pub fn types(&self) -> impl Iterator<Item = &str> + '_ {
        self.lengths.keys().map(String::as_str)
    }

    pub fn type_count(&self) -> usize {
        self.lengths.len()
    }

    pub fn word_type(&self, word: &str) -> Option<WordType> {
        self.lengths.get(word).map(|&length| WordType {
            text: word.to_string(),
            length,
            count: self.count(word),
        })
    }

    pub fn word_types(&self) -> impl Iterator<Item = WordType> + '_ {
        self.lengths.iter().map(|(w, &length)| WordType {
            text: w.clone(),
            length,
            count: self.count(w),
        })
    }
}

/// Splits interval texts into whitespace tokens, dropping the ones `filter` rejects.
pub fn tokenize<'a, I>(texts: I, filter: &TokenFilter) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .flat_map(str::split_whitespace)
        .filter(|tok| filter.keeps(tok))
        .map(str::to_string)
        .collect()
}

/// Reads every interval of the corpus and returns its filtered token stream.
/// Files that cannot be parsed are reported and left out.
pub fn collect_tokens(corpus: &dyn CorpusAccessor, filter: &TokenFilter) -> Result<Vec<String>> {
    let files = corpus.list_files()?;
    info!("Reading {} annotation files.", files.len());
    let mut tokens = Vec::new();
    for file in &files {
        match corpus.list_intervals(file) {
            Ok(texts) => tokens.extend(tokenize(texts.iter().map(String::as_str), filter)),
            Err(e) if !e.is_fatal() => warn!("Skipping {}: {e}", file.display()),
            Err(e) => return Err(e),
        }
    }
    info!("Extracted {} word tokens.", tokens.len());
    Ok(tokens)
}
