// File: src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// The operator-facing category of a failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// Bad input to an analysis run that can be skipped (e.g. an unknown mandatory word).
    Configuration,
    /// A log file, annotation file or interval that does not exist.
    NotFound,
    /// The clustering did not partition the vocabulary.
    ConsistencyFault,
    /// An operator command that could not be understood.
    InputParse,
    /// Anything coming from the filesystem or a malformed artifact.
    Io,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SpellerError {
    #[error("configuration: {0}")]
    Configuration(String),

    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("interval {index} is out of range for {} ({len} intervals)", path.display())]
    IntervalOutOfRange { path: PathBuf, index: usize, len: usize },

    #[error("clustering assigned {assigned} of {expected} word types")]
    ConsistencyFault { assigned: usize, expected: usize },

    #[error("\"{0}\" is not a valid choice")]
    InputParse(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("log line {line}: {reason}")]
    LogFormat { line: usize, reason: String },

    #[error("{} looks like replay output, refusing to replay onto it", .0.display())]
    ModifiedCorpus(PathBuf),

    #[error("{}: unsupported text encoding", .0.display())]
    Encoding(PathBuf),

    #[error("{}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl SpellerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SpellerError::Io { path: path.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SpellerError::Configuration(_) => ErrorKind::Configuration,
            SpellerError::NotFound { .. } | SpellerError::IntervalOutOfRange { .. } => {
                ErrorKind::NotFound
            }
            SpellerError::ConsistencyFault { .. } => ErrorKind::ConsistencyFault,
            SpellerError::InputParse(_) => ErrorKind::InputParse,
            SpellerError::Io { .. }
            | SpellerError::ConfigParse { .. }
            | SpellerError::Pattern(_)
            | SpellerError::LogFormat { .. }
            | SpellerError::ModifiedCorpus(_)
            | SpellerError::Encoding(_)
            | SpellerError::Malformed { .. } => ErrorKind::Io,
        }
    }

    /// Whether the current run must stop. Everything else is reported and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SpellerError::ConsistencyFault { .. }
                | SpellerError::ConfigParse { .. }
                | SpellerError::ModifiedCorpus(_)
                | SpellerError::Io { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SpellerError>;
