// File: src/corpus/mod.rs
pub mod encoding;
pub mod plaintext;
pub mod textgrid;

use crate::config::InputFormat;
use crate::error::{Result, SpellerError};
use crate::persistence::write_atomic;
use encoding::TextEncoding;
use std::fs;
use std::io::ErrorKind;
use std::ops::Range;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One labelled interval: its decoded text and where the raw label sits in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub span: Range<usize>,
    pub text: String,
}

/// A parsed annotation file together with the bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct AnnotationFile {
    pub path: PathBuf,
    pub format: InputFormat,
    pub encoding: TextEncoding,
    pub content: String,
    pub intervals: Vec<Interval>,
}

impl AnnotationFile {
    pub fn parse(
        path: &Path,
        format: InputFormat,
        encoding: TextEncoding,
        content: String,
    ) -> Result<Self> {
        let intervals = match format {
            InputFormat::Textgrid => textgrid::parse_first_tier(&content).map_err(|reason| {
                SpellerError::Malformed { path: path.to_path_buf(), reason }
            })?,
            InputFormat::Plaintext => plaintext::parse_lines(&content),
        };
        Ok(Self { path: path.to_path_buf(), format, encoding, content, intervals })
    }

    pub fn interval(&self, index: usize) -> Result<&Interval> {
        self.intervals.get(index).ok_or_else(|| SpellerError::IntervalOutOfRange {
            path: self.path.clone(),
            index,
            len: self.intervals.len(),
        })
    }

    /// Byte range of the `instance`-th whitespace token equal to `word` inside interval `index`.
    pub fn token_span(&self, index: usize, word: &str, instance: usize) -> Result<Option<Range<usize>>> {
        let interval = self.interval(index)?;
        let raw = &self.content[interval.span.clone()];
        let span = whitespace_tokens(raw)
            .into_iter()
            .filter(|(_, tok)| self.unescape(tok) == word)
            .nth(instance)
            .map(|(start, tok)| {
                let abs = interval.span.start + start;
                abs..abs + tok.len()
            });
        Ok(span)
    }

    /// Text as it must appear inside a label of this file.
    pub fn escape(&self, text: &str) -> String {
        match self.format {
            InputFormat::Textgrid => textgrid::escape(text),
            InputFormat::Plaintext => text.to_string(),
        }
    }

    fn unescape(&self, raw: &str) -> String {
        match self.format {
            InputFormat::Textgrid => textgrid::unescape(raw),
            InputFormat::Plaintext => raw.to_string(),
        }
    }

    /// Applies non-overlapping byte-range replacements and returns the new content.
    pub fn with_edits(&self, mut edits: Vec<(Range<usize>, String)>) -> String {
        edits.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
        let mut out = self.content.clone();
        for (range, replacement) in edits {
            out.replace_range(range, &replacement);
        }
        out
    }
}

/// Non-empty whitespace-separated tokens with their byte offsets in `s`.
pub fn whitespace_tokens(s: &str) -> Vec<(usize, &str)> {
    s.split(char::is_whitespace)
        .filter(|piece| !piece.is_empty())
        .map(|piece| (piece.as_ptr() as usize - s.as_ptr() as usize, piece))
        .collect()
}

/// Read access to an annotated corpus. Listings must be stable between calls
/// on an unchanged corpus.
pub trait CorpusAccessor {
    fn list_files(&self) -> Result<Vec<PathBuf>>;

    fn load(&self, file: &Path) -> Result<AnnotationFile>;

    fn read_raw(&self, file: &Path) -> Result<(String, TextEncoding)>;

    fn write_raw(&self, path: &Path, content: &str, encoding: TextEncoding) -> Result<()> {
        write_atomic(path, &encoding.encode(content))
    }

    fn list_intervals(&self, file: &Path) -> Result<Vec<String>> {
        Ok(self.load(file)?.intervals.into_iter().map(|i| i.text).collect())
    }
}

/// A corpus stored as a directory tree of annotation files.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
    format: InputFormat,
    encoding: Option<TextEncoding>,
    excluded: Vec<PathBuf>,
}

impl DirectoryCorpus {
    pub fn new(root: impl Into<PathBuf>, format: InputFormat) -> Self {
        Self { root: root.into(), format, encoding: None, excluded: Vec::new() }
    }

    /// Reads every file with `encoding` instead of detecting it.
    pub fn with_encoding(mut self, encoding: Option<TextEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    /// Skips a directory (typically an output tree nested in the corpus) while listing.
    pub fn excluding(mut self, dir: &Path) -> Self {
        self.excluded.push(fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    /// `file` relative to the corpus root, for mirroring into an output root.
    pub fn relative_path<'a>(&self, file: &'a Path) -> &'a Path {
        file.strip_prefix(&self.root).unwrap_or(file)
    }

    fn is_excluded(&self, dir: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        self.excluded.iter().any(|ex| dir.starts_with(ex))
    }

    /// Sorted annotation files under `dir`, which must lie inside the corpus.
    pub fn list_files_under(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(SpellerError::NotFound { what: "corpus directory", path: dir.to_path_buf() });
        }
        let extension = self.format.extension();
        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && e.depth() > 0 && self.is_excluded(e.path())));
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                SpellerError::io(path, e.into())
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == extension)
            {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl CorpusAccessor for DirectoryCorpus {
    fn list_files(&self) -> Result<Vec<PathBuf>> {
        self.list_files_under(&self.root)
    }

    fn load(&self, file: &Path) -> Result<AnnotationFile> {
        let (content, encoding) = self.read_raw(file)?;
        AnnotationFile::parse(file, self.format, encoding, content)
    }

    fn read_raw(&self, file: &Path) -> Result<(String, TextEncoding)> {
        let bytes = fs::read(file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                SpellerError::NotFound { what: "annotation file", path: file.to_path_buf() }
            }
            _ => SpellerError::io(file, e),
        })?;
        let encoding = match self.encoding {
            Some(forced) => forced.matching_bom(&bytes),
            None => TextEncoding::detect(&bytes),
        };
        let content = encoding
            .decode(&bytes)
            .ok_or_else(|| SpellerError::Encoding(file.to_path_buf()))?;
        Ok((content, encoding))
    }
}
