// File: src/config.rs
use crate::corpus::encoding::TextEncoding;
use crate::error::{Result, SpellerError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which kind of annotation files make up the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Textgrid,
    Plaintext,
}

impl InputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            InputFormat::Textgrid => "TextGrid",
            InputFormat::Plaintext => "txt",
        }
    }
}

/// How the search word of a global change is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PatternMode {
    /// The search word is a literal substring.
    Literal,
    /// The search word is a regular expression.
    Regex,
}

/// Top-level configuration. Every field has a default so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpellerConfig {
    pub input_format: InputFormat,
    /// Word types must be strictly longer than this to be reviewed.
    pub min_word_length: usize,
    pub cluster: MatchLimits,
    pub session: MatchLimits,
    pub tokens: TokenFilter,
    /// Forces one encoding instead of BOM detection.
    pub encoding: Option<TextEncoding>,
    pub log_dir: PathBuf,
    pub replay: ReplayConfig,
}

/// Similarity limits for one use of the matcher.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MatchLimits {
    pub ratio_threshold: f64,
    pub max_alternatives: Option<usize>,
}

/// Tokens dropped before the vocabulary is counted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenFilter {
    pub drop_suffixes: Vec<String>,
    pub drop_prefixes: Vec<String>,
    pub drop_exact: Vec<String>,
    /// Drop tokens carrying both `[` and `]`.
    pub drop_bracketed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub changed_dir: PathBuf,
    pub global_dir: PathBuf,
    /// Global changes only walk this subtree of the corpus root.
    pub annotation_subdir: Option<PathBuf>,
    pub global_pattern: PatternMode,
}

impl Default for SpellerConfig {
    fn default() -> Self {
        Self {
            input_format: InputFormat::Textgrid,
            min_word_length: 4,
            cluster: MatchLimits { ratio_threshold: 0.7, max_alternatives: Some(2) },
            session: MatchLimits { ratio_threshold: 0.7, max_alternatives: Some(4) },
            tokens: TokenFilter::default(),
            encoding: None,
            log_dir: PathBuf::from("log"),
            replay: ReplayConfig::default(),
        }
    }
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self { ratio_threshold: 0.0, max_alternatives: None }
    }
}

impl Default for TokenFilter {
    fn default() -> Self {
        Self {
            drop_suffixes: vec!["_fra".into(), "_ara".into(), "_eng".into()],
            drop_prefixes: vec!["<fil>".into()],
            drop_exact: vec!["JUNK".into()],
            drop_bracketed: true,
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            changed_dir: PathBuf::from("changed_textgrid_files"),
            global_dir: PathBuf::from("globally_changed_textgrid_files"),
            annotation_subdir: None,
            global_pattern: PatternMode::Literal,
        }
    }
}

impl TokenFilter {
    /// A filter that keeps every token.
    pub fn none() -> Self {
        Self {
            drop_suffixes: Vec::new(),
            drop_prefixes: Vec::new(),
            drop_exact: Vec::new(),
            drop_bracketed: false,
        }
    }

    pub fn keeps(&self, token: &str) -> bool {
        if self.drop_suffixes.iter().any(|s| token.ends_with(s.as_str())) {
            return false;
        }
        if self.drop_bracketed && token.contains('[') && token.contains(']') {
            return false;
        }
        if self.drop_exact.iter().any(|s| s == token) {
            return false;
        }
        !self.drop_prefixes.iter().any(|p| token.starts_with(p.as_str()))
    }
}

impl SpellerConfig {
    /// Loads `path` if given; a missing path argument yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| SpellerError::io(path, e))?;
        toml::from_str(&raw).map_err(|source| SpellerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Reads a word list, one word per line; blank lines are skipped.
pub fn read_word_list(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SpellerError::NotFound { what: "word list", path: path.to_path_buf() },
        _ => SpellerError::io(path, e),
    })?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect())
}
