// File: src/session.rs
use crate::config::MatchLimits;
use crate::core::similarity::rank;
use crate::core::types::{Occurrence, SimilarityPair, Worklist};
use crate::core::vocabulary::VocabularyIndex;
use crate::core::worklist::build_worklist;
use crate::corpus::CorpusAccessor;
use crate::decision_log::{GlobalChange, Location, LogRecord, LogSink, Note, TargetedChange};
use crate::error::{Result, SpellerError};
use log::debug;

/// Ratio shown for corrections typed in by the operator.
pub const TYPED_RATIO: f64 = 0.0;

/// What the operator typed at the occurrence prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChoice {
    Number(usize),
    Accept,
    EnterCorrection,
    EnterGlobal,
    EnterNote,
    Back,
    Quit,
}

impl SessionChoice {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        match input {
            "" => Ok(SessionChoice::Accept),
            "e" => Ok(SessionChoice::EnterCorrection),
            "g" => Ok(SessionChoice::EnterGlobal),
            "l" => Ok(SessionChoice::EnterNote),
            "b" => Ok(SessionChoice::Back),
            "q" => Ok(SessionChoice::Quit),
            s if s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse()
                .map(SessionChoice::Number)
                .map_err(|_| SpellerError::InputParse(s.to_string())),
            s => Err(SpellerError::InputParse(s.to_string())),
        }
    }
}

/// A fully specified operator decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Replace the occurrence with `matches[k]`.
    Select(usize),
    /// Leave the occurrence as it is.
    Accept,
    /// Replace the occurrence with typed text.
    Correct(String),
    /// Replace the word in every file and end the session.
    Global(String),
    Back,
    Note(String),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Reviewing(usize),
}

/// Result of applying one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The cursor moved (or stayed at 0 on `Back`); the session continues.
    Continue,
    /// The last occurrence was handled.
    Finished,
    /// The operator left the session.
    Quit,
}

/// Cursor over the worklist of one word. Decisions go to the log, never to
/// the corpus; a command is acknowledged only after its record is durable.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    worklist: Worklist,
    matches: Vec<SimilarityPair>,
    state: SessionState,
}

impl ReviewSession {
    pub fn new(worklist: Worklist, matches: Vec<SimilarityPair>) -> Self {
        let state = if worklist.is_empty() { SessionState::Idle } else { SessionState::Reviewing(0) };
        Self { worklist, matches, state }
    }

    /// Ranks alternatives for `word` against the vocabulary and builds its worklist.
    pub fn start(word: &str, vocab: &VocabularyIndex, corpus: &dyn CorpusAccessor, limits: MatchLimits) -> Result<Self> {
        let matches = rank(word, vocab.types(), limits.ratio_threshold, limits.max_alternatives);
        let worklist = build_worklist(word, corpus)?;
        Ok(Self::new(worklist, matches))
    }

    pub fn word(&self) -> &str {
        self.worklist.word()
    }

    pub fn worklist(&self) -> &Worklist {
        &self.worklist
    }

    pub fn matches(&self) -> &[SimilarityPair] {
        &self.matches
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current(&self) -> Option<&Occurrence> {
        match self.state {
            SessionState::Reviewing(cursor) => self.worklist.get(cursor),
            SessionState::Idle => None,
        }
    }

    pub fn apply(&mut self, command: SessionCommand, log: &mut dyn LogSink) -> Result<Step> {
        let (SessionState::Reviewing(cursor), Some(occ)) = (self.state, self.current()) else {
            return Ok(Step::Finished);
        };
        let at = Location { file: occ.file.clone(), interval: occ.interval, instance: occ.instance };
        debug!("\"{}\" occurrence {cursor}: {command:?}", self.word());

        match command {
            SessionCommand::Select(k) => {
                let Some(choice) = self.matches.get(k) else {
                    return Err(SpellerError::InputParse(k.to_string()));
                };
                let correction = choice.word.clone();
                self.emit_change(at, correction, log)?;
                Ok(self.advance(cursor))
            }
            SessionCommand::Accept => Ok(self.advance(cursor)),
            SessionCommand::Correct(text) => {
                let text = non_empty(text)?;
                self.emit_change(at, text.clone(), log)?;
                if !self.matches.iter().any(|m| m.word == text) {
                    self.matches.push(SimilarityPair { word: text, ratio: TYPED_RATIO });
                }
                Ok(self.advance(cursor))
            }
            SessionCommand::Global(text) => {
                let correction = non_empty(text)?;
                let record = LogRecord::Global(GlobalChange { search: self.word().to_string(), correction });
                log.record(&record)?;
                self.state = SessionState::Idle;
                Ok(Step::Quit)
            }
            SessionCommand::Back => {
                self.state = SessionState::Reviewing(cursor.saturating_sub(1));
                Ok(Step::Continue)
            }
            SessionCommand::Note(text) => {
                let record = LogRecord::Note(Note { search: self.word().to_string(), at, text });
                log.record(&record)?;
                Ok(self.advance(cursor))
            }
            SessionCommand::Quit => {
                self.state = SessionState::Idle;
                Ok(Step::Quit)
            }
        }
    }

    fn emit_change(&self, at: Location, correction: String, log: &mut dyn LogSink) -> Result<()> {
        let record = LogRecord::Change(TargetedChange { search: self.word().to_string(), at, correction });
        log.record(&record)
    }

    fn advance(&mut self, cursor: usize) -> Step {
        if cursor + 1 < self.worklist.len() {
            self.state = SessionState::Reviewing(cursor + 1);
            Step::Continue
        } else {
            self.state = SessionState::Idle;
            Step::Finished
        }
    }
}

fn non_empty(text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(SpellerError::InputParse(text))
    } else {
        Ok(trimmed.to_string())
    }
}
