// File: src/decision_log.rs
//! The durable, append-only record of operator decisions.
//!
//! One line per entry: a timestamp, a marker token, then marker-specific
//! fields in fixed positions. Free-form fields are JSON-quoted so that spaces
//! and quotes survive the round trip.
//!
//! ```text
//! <ts> :Change "<search>" in file "<path>" interval <N> instance <M> to "<correction>"
//! <ts> :Globally "<search>" to "<correction>"
//! <ts> :Note "<search>" in file "<path>" interval <N> instance <M> says "<text>"
//! <ts> :Session "<message>"
//! ```
//!
//! Interval and instance numbers are 1-based on disk and 0-based in memory.

use crate::error::{Result, SpellerError};
use chrono::{Local, SecondsFormat, Utc};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const CHANGE: &str = ":Change";
const GLOBALLY: &str = ":Globally";
const NOTE: &str = ":Note";
const SESSION: &str = ":Session";

/// Coordinates of one occurrence, all 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub interval: usize,
    pub instance: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedChange {
    pub search: String,
    pub at: Location,
    pub correction: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalChange {
    pub search: String,
    pub correction: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub search: String,
    pub at: Location,
    pub text: String,
}

/// A decoded log entry. Notes carry no correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Change(TargetedChange),
    Global(GlobalChange),
    Note(Note),
}

impl LogRecord {
    pub fn is_change(&self) -> bool {
        !matches!(self, LogRecord::Note(_))
    }

    /// Decodes one line. `Ok(None)` for lines that are not records
    /// (session events, blank or foreign lines).
    pub fn parse_line(line: &str) -> std::result::Result<Option<LogRecord>, String> {
        let marker = line.split_whitespace().nth(1).unwrap_or("");
        if ![CHANGE, GLOBALLY, NOTE].contains(&marker) {
            return Ok(None);
        }
        let tokens = tokenize(line)?;
        if tokens.len() < 2 || tokens[1].quoted {
            return Err("record marker must follow the timestamp".to_string());
        }
        let fields = Fields { tokens: &tokens[2..] };
        let record = match marker {
            CHANGE => {
                fields.expect_len(10)?;
                LogRecord::Change(TargetedChange {
                    search: fields.search(0)?,
                    at: fields.location(1)?,
                    correction: fields.keyword(8, "to").and_then(|_| fields.value(9))?,
                })
            }
            GLOBALLY => {
                fields.expect_len(3)?;
                LogRecord::Global(GlobalChange {
                    search: fields.search(0)?,
                    correction: fields.keyword(1, "to").and_then(|_| fields.value(2))?,
                })
            }
            NOTE => {
                fields.expect_len(10)?;
                LogRecord::Note(Note {
                    search: fields.value(0)?,
                    at: fields.location(1)?,
                    text: fields.keyword(8, "says").and_then(|_| fields.value(9))?,
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(record))
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.escape_default()))
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "in file {} interval {} instance {}",
            quote(&self.file.to_string_lossy()),
            self.interval + 1,
            self.instance + 1
        )
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRecord::Change(c) => {
                write!(f, "{CHANGE} {} {} to {}", quote(&c.search), c.at, quote(&c.correction))
            }
            LogRecord::Global(g) => {
                write!(f, "{GLOBALLY} {} to {}", quote(&g.search), quote(&g.correction))
            }
            LogRecord::Note(n) => {
                write!(f, "{NOTE} {} {} says {}", quote(&n.search), n.at, quote(&n.text))
            }
        }
    }
}

#[derive(Debug)]
struct Token {
    text: String,
    quoted: bool,
}

fn tokenize(line: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_end_matches(['\n', '\r']);
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(tokens);
        }
        if rest.starts_with('"') {
            let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<String>();
            let text = match stream.next() {
                Some(Ok(text)) => text,
                _ => return Err("unterminated quoted field".to_string()),
            };
            let consumed = stream.byte_offset();
            tokens.push(Token { text, quoted: true });
            rest = &rest[consumed..];
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(Token { text: rest[..end].to_string(), quoted: false });
            rest = &rest[end..];
        }
    }
}

/// Marker-relative view of a tokenized line.
struct Fields<'a> {
    tokens: &'a [Token],
}

impl Fields<'_> {
    fn expect_len(&self, len: usize) -> std::result::Result<(), String> {
        if self.tokens.len() == len {
            Ok(())
        } else {
            Err(format!("expected {len} fields after the marker, found {}", self.tokens.len()))
        }
    }

    fn value(&self, pos: usize) -> std::result::Result<String, String> {
        match self.tokens.get(pos) {
            Some(t) if t.quoted => Ok(t.text.clone()),
            Some(t) => Err(format!("field {pos} must be quoted, found {}", t.text)),
            None => Err(format!("missing field {pos}")),
        }
    }

    /// A search word; an empty one would match everywhere.
    fn search(&self, pos: usize) -> std::result::Result<String, String> {
        let word = self.value(pos)?;
        if word.is_empty() {
            return Err("empty search word".to_string());
        }
        Ok(word)
    }

    fn keyword(&self, pos: usize, word: &str) -> std::result::Result<(), String> {
        match self.tokens.get(pos) {
            Some(t) if !t.quoted && t.text == word => Ok(()),
            _ => Err(format!("expected \"{word}\" at field {pos}")),
        }
    }

    fn number(&self, pos: usize) -> std::result::Result<usize, String> {
        let raw = self.tokens.get(pos).map(|t| t.text.as_str()).unwrap_or("");
        match raw.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("expected a 1-based number at field {pos}, found \"{raw}\"")),
        }
    }

    /// `in file <path> interval <N> instance <M>` starting at `pos`.
    fn location(&self, pos: usize) -> std::result::Result<Location, String> {
        self.keyword(pos, "in")?;
        self.keyword(pos + 1, "file")?;
        let file = PathBuf::from(self.value(pos + 2)?);
        self.keyword(pos + 3, "interval")?;
        let interval = self.number(pos + 4)?;
        self.keyword(pos + 5, "instance")?;
        let instance = self.number(pos + 6)?;
        Ok(Location { file, interval, instance })
    }
}

/// A line of the log that decoded to a record, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedRecord {
    pub line: usize,
    pub record: LogRecord,
}

/// Decodes every record of a log, in order. Malformed record lines are
/// returned as errors next to the good ones so callers can skip them.
pub fn parse_log(contents: &str) -> Vec<Result<NumberedRecord>> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match LogRecord::parse_line(line) {
            Ok(Some(record)) => Some(Ok(NumberedRecord { line: idx + 1, record })),
            Ok(None) => None,
            Err(reason) => Some(Err(SpellerError::LogFormat { line: idx + 1, reason })),
        })
        .collect()
}

/// Destination of decisions made during a session.
pub trait LogSink {
    /// Must not return before the record is durable.
    fn record(&mut self, record: &LogRecord) -> Result<()>;

    /// Informational line; never replayed.
    fn event(&mut self, message: &str) -> Result<()>;
}

impl LogSink for Vec<LogRecord> {
    fn record(&mut self, record: &LogRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }

    fn event(&mut self, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// File-backed log. Every line is flushed and synced before `record` returns.
pub struct DecisionLog {
    path: PathBuf,
    file: File,
}

impl DecisionLog {
    /// Opens a fresh `logfile_<yymmdd_HHMMSS>.txt` in `dir`, creating `dir`.
    pub fn create_in(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| SpellerError::io(dir, e))?;
        let name = format!("logfile_{}.txt", Local::now().format("%y%m%d_%H%M%S"));
        Self::open(&dir.join(name))
    }

    /// Opens `path` for appending.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SpellerError::io(path, e))?;
        Ok(Self { path: path.to_path_buf(), file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, body: &str) -> Result<()> {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        writeln!(self.file, "{stamp} {body}").map_err(|e| SpellerError::io(&self.path, e))?;
        self.file.flush().map_err(|e| SpellerError::io(&self.path, e))?;
        self.file.sync_data().map_err(|e| SpellerError::io(&self.path, e))
    }
}

impl LogSink for DecisionLog {
    fn record(&mut self, record: &LogRecord) -> Result<()> {
        self.append(&record.to_string())
    }

    fn event(&mut self, message: &str) -> Result<()> {
        self.append(&format!("{SESSION} {}", quote(message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change() -> LogRecord {
        LogRecord::Change(TargetedChange {
            search: "exampel".into(),
            at: Location { file: "corpus/my file.TextGrid".into(), interval: 0, instance: 1 },
            correction: "example".into(),
        })
    }

    #[test]
    fn change_line_uses_one_based_coordinates() {
        let line = format!("2026-10-17T10:00:00.000Z {}", change());
        assert_eq!(
            line,
            "2026-10-17T10:00:00.000Z :Change \"exampel\" in file \"corpus/my file.TextGrid\" interval 1 instance 2 to \"example\""
        );
        assert_eq!(LogRecord::parse_line(&line).unwrap(), Some(change()));
    }

    #[test]
    fn note_text_mentioning_a_change_stays_a_note() {
        let note = LogRecord::Note(Note {
            search: "teh".into(),
            at: Location { file: "a.TextGrid".into(), interval: 2, instance: 0 },
            text: ":Change \"teh\" to \"the\" maybe?".into(),
        });
        let line = format!("ts {note}");
        let parsed = LogRecord::parse_line(&line).unwrap().unwrap();
        assert!(!parsed.is_change());
        assert_eq!(parsed, note);
    }

    #[test]
    fn session_and_foreign_lines_are_not_records() {
        assert_eq!(LogRecord::parse_line("ts :Session \"Working on \\\"teh\\\"\"").unwrap(), None);
        assert_eq!(LogRecord::parse_line("").unwrap(), None);
        assert_eq!(LogRecord::parse_line("INFO:root:Starting").unwrap(), None);
    }

    #[test]
    fn malformed_change_is_an_error() {
        assert!(LogRecord::parse_line("ts :Change \"a\" in file \"b\" interval 0 instance 1 to \"c\"").is_err());
        assert!(LogRecord::parse_line("ts :Globally \"teh\" \"the\"").is_err());
        assert!(LogRecord::parse_line("ts :Change \"unterminated").is_err());
    }

    #[test]
    fn empty_search_word_is_rejected() {
        assert!(LogRecord::parse_line("ts :Globally \"\" to \"the\"").is_err());
        assert!(LogRecord::parse_line("ts :Change \"\" in file \"b\" interval 1 instance 1 to \"c\"").is_err());
        let entries = parse_log("ts :Globally \"\" to \"the\"\n");
        assert!(matches!(entries[0], Err(SpellerError::LogFormat { line: 1, .. })));
    }

    #[test]
    fn file_log_appends_and_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = DecisionLog::create_in(&dir.path().join("log")).unwrap();
        log.event("Starting").unwrap();
        log.record(&change()).unwrap();
        let global = LogRecord::Global(GlobalChange { search: "teh".into(), correction: "the".into() });
        log.record(&global).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let records: Vec<NumberedRecord> = parse_log(&contents).into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], NumberedRecord { line: 2, record: change() });
        assert_eq!(records[1].record, global);
    }
}
