// File: src/replay.rs
//! Applies a decision log to a copy of the corpus.
//!
//! Targeted changes are resolved against the original files and written to
//! the changed-files root; global changes are substituted over the raw text
//! of every annotation file and written to the global root. Originals and
//! the log are never modified.

use crate::config::{InputFormat, PatternMode, ReplayConfig};
use crate::corpus::{textgrid, CorpusAccessor, DirectoryCorpus};
use crate::decision_log::{parse_log, GlobalChange, LogRecord, TargetedChange};
use crate::error::{Result, SpellerError};
use crate::persistence::write_atomic;
use log::{debug, info, warn};
use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};

/// Dropped into every output root; a corpus root carrying it is refused.
pub const REPLAY_MARKER: &str = ".speller-replay";

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub changed_root: PathBuf,
    pub global_root: PathBuf,
    /// Global changes only walk this subtree of the corpus root.
    pub annotation_subdir: Option<PathBuf>,
    pub pattern: PatternMode,
}

impl From<&ReplayConfig> for ReplayOptions {
    fn from(cfg: &ReplayConfig) -> Self {
        Self {
            changed_root: cfg.changed_dir.clone(),
            global_root: cfg.global_dir.clone(),
            annotation_subdir: cfg.annotation_subdir.clone(),
            pattern: cfg.global_pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// 1-based line of the log.
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub skipped: Vec<SkippedRecord>,
    pub files_written: Vec<PathBuf>,
}

impl ReplaySummary {
    fn skip(&mut self, line: usize, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Skipping log line {line}: {reason}");
        self.skipped.push(SkippedRecord { line, reason });
    }
}

/// One resolved edit of a targeted change.
struct PendingEdit {
    line: usize,
    range: Range<usize>,
    replacement: String,
}

/// Replays every change of the log at `log_path` onto copies of `corpus`.
///
/// A missing log is returned as `NotFound`. Problems with single records
/// (missing file, interval out of range, word not at the logged position)
/// are collected in the summary and the remaining records still apply.
pub fn apply_log(log_path: &Path, corpus: &DirectoryCorpus, options: &ReplayOptions) -> Result<ReplaySummary> {
    let contents = fs::read_to_string(log_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SpellerError::NotFound { what: "log file", path: log_path.to_path_buf() },
        _ => SpellerError::io(log_path, e),
    })?;
    ensure_pristine(corpus.root(), options)?;

    let mut summary = ReplaySummary::default();
    let mut targeted: BTreeMap<PathBuf, Vec<(usize, TargetedChange)>> = BTreeMap::new();
    let mut global: Vec<(usize, GlobalChange)> = Vec::new();
    for entry in parse_log(&contents) {
        match entry {
            Ok(numbered) => match numbered.record {
                LogRecord::Change(change) => {
                    targeted.entry(change.at.file.clone()).or_default().push((numbered.line, change));
                }
                LogRecord::Global(change) => global.push((numbered.line, change)),
                LogRecord::Note(_) => debug!("Line {} is a note", numbered.line),
            },
            Err(SpellerError::LogFormat { line, reason }) => summary.skip(line, reason),
            Err(e) => return Err(e),
        }
    }
    info!(
        "{} targeted and {} global changes to be made found.",
        targeted.values().map(Vec::len).sum::<usize>(),
        global.len()
    );

    for (logged, changes) in targeted {
        apply_targeted(&logged, changes, corpus, options, &mut summary)?;
    }
    if !global.is_empty() {
        apply_global(global, corpus, options, &mut summary)?;
    }
    info!(
        "Applied {} records, skipped {}, wrote {} files.",
        summary.applied,
        summary.skipped.len(),
        summary.files_written.len()
    );
    Ok(summary)
}

/// Refuses corpus roots that are, or sit inside, replay output.
fn ensure_pristine(root: &Path, options: &ReplayOptions) -> Result<()> {
    let root_abs = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    if root_abs.ancestors().any(|dir| dir.join(REPLAY_MARKER).exists()) {
        return Err(SpellerError::ModifiedCorpus(root.to_path_buf()));
    }
    for out in [&options.changed_root, &options.global_root] {
        if let Ok(out_abs) = fs::canonicalize(out) {
            if root_abs.starts_with(&out_abs) {
                return Err(SpellerError::ModifiedCorpus(root.to_path_buf()));
            }
        }
    }
    Ok(())
}

fn apply_targeted(
    logged: &Path,
    changes: Vec<(usize, TargetedChange)>,
    corpus: &DirectoryCorpus,
    options: &ReplayOptions,
    summary: &mut ReplaySummary,
) -> Result<()> {
    let Some(rel) = corpus_relative(corpus.root(), logged) else {
        for (line, _) in &changes {
            summary.skip(*line, format!("{} is not inside the corpus root", logged.display()));
        }
        return Ok(());
    };
    let source = corpus.root().join(&rel);
    let file = match corpus.load(&source) {
        Ok(file) => file,
        Err(e) if !e.is_fatal() => {
            for (line, _) in &changes {
                summary.skip(*line, e.to_string());
            }
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    // Keyed by start offset: a later record at the same coordinate supersedes the earlier one.
    let mut edits: BTreeMap<usize, PendingEdit> = BTreeMap::new();
    for (line, change) in changes {
        let at = &change.at;
        let range = match file.token_span(at.interval, &change.search, at.instance) {
            Ok(Some(range)) => range,
            Ok(None) => {
                summary.skip(
                    line,
                    format!(
                        "\"{}\" instance {} not found in interval {} of {}",
                        change.search,
                        at.instance + 1,
                        at.interval + 1,
                        source.display()
                    ),
                );
                continue;
            }
            Err(e) => {
                summary.skip(line, e.to_string());
                continue;
            }
        };
        let edit = PendingEdit { line, range, replacement: file.escape(&change.correction) };
        if let Some(previous) = edits.insert(edit.range.start, edit) {
            summary.skip(previous.line, format!("superseded by log line {line}"));
        }
    }
    if edits.is_empty() {
        return Ok(());
    }

    summary.applied += edits.len();
    let new_content = file.with_edits(edits.into_values().map(|e| (e.range, e.replacement)).collect());
    let target = options.changed_root.join(&rel);
    mark_output_root(&options.changed_root)?;
    corpus.write_raw(&target, &new_content, file.encoding)?;
    info!("Wrote {}", target.display());
    summary.files_written.push(target);
    Ok(())
}

fn apply_global(
    changes: Vec<(usize, GlobalChange)>,
    corpus: &DirectoryCorpus,
    options: &ReplayOptions,
    summary: &mut ReplaySummary,
) -> Result<()> {
    // Search words and corrections as they are written inside a label.
    let in_label = |text: &str| match corpus.format() {
        InputFormat::Textgrid => textgrid::escape(text),
        InputFormat::Plaintext => text.to_string(),
    };
    let mut patterns: Vec<(usize, Regex, String)> = Vec::new();
    for (line, change) in changes {
        let source = match options.pattern {
            PatternMode::Literal => regex::escape(&in_label(&change.search)),
            PatternMode::Regex => change.search.clone(),
        };
        match Regex::new(&source) {
            Ok(re) => patterns.push((line, re, in_label(&change.correction))),
            Err(e) => summary.skip(line, SpellerError::Pattern(e).to_string()),
        }
    }

    let subtree = match &options.annotation_subdir {
        Some(sub) => corpus.root().join(sub),
        None => corpus.root().to_path_buf(),
    };
    let sources = match corpus.list_files_under(&subtree) {
        Ok(sources) => sources,
        Err(e) => {
            for (line, _, _) in &patterns {
                summary.skip(*line, e.to_string());
            }
            return Ok(());
        }
    };
    let outputs: Vec<PathBuf> = [&options.changed_root, &options.global_root]
        .into_iter()
        .filter_map(|p| fs::canonicalize(p).ok())
        .collect();

    let mut matched = vec![false; patterns.len()];
    for source in sources {
        if let Ok(abs) = fs::canonicalize(&source) {
            if outputs.iter().any(|out| abs.starts_with(out)) {
                continue;
            }
        }
        let (original, encoding) = match corpus.read_raw(&source) {
            Ok(raw) => raw,
            Err(e) if !e.is_fatal() => {
                warn!("Skipping {}: {e}", source.display());
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut content = original.clone();
        for (idx, (_, re, correction)) in patterns.iter().enumerate() {
            if re.is_match(&content) {
                matched[idx] = true;
                content = re.replace_all(&content, NoExpand(correction)).into_owned();
            }
        }
        if content == original {
            continue;
        }
        let rel = corpus.relative_path(&source).to_path_buf();
        let target = options.global_root.join(rel);
        mark_output_root(&options.global_root)?;
        corpus.write_raw(&target, &content, encoding)?;
        info!("Wrote {}", target.display());
        summary.files_written.push(target);
    }

    for ((line, re, _), hit) in patterns.iter().zip(matched) {
        if hit {
            summary.applied += 1;
        } else {
            summary.skip(*line, format!("pattern {} matched no annotation file", re.as_str()));
        }
    }
    Ok(())
}

fn mark_output_root(root: &Path) -> Result<()> {
    let marker = root.join(REPLAY_MARKER);
    if marker.exists() {
        return Ok(());
    }
    write_atomic(&marker, b"This directory holds replayed spelling corrections. Do not replay onto it.\n")
}

/// Path of a logged file relative to the corpus root. Logged paths are either
/// root-joined (as enumerated by the session) or already relative to the root.
fn corpus_relative(root: &Path, logged: &Path) -> Option<PathBuf> {
    let root_n = lexical(root);
    let logged_n = lexical(logged);
    if let Ok(rel) = logged_n.strip_prefix(&root_n) {
        return Some(rel.to_path_buf());
    }
    if let (Ok(root_abs), Ok(logged_abs)) = (fs::canonicalize(root), fs::canonicalize(logged)) {
        if let Ok(rel) = logged_abs.strip_prefix(&root_abs) {
            return Some(rel.to_path_buf());
        }
    }
    if logged.is_relative() && !logged_n.components().any(|c| c == Component::ParentDir) {
        return Some(logged_n);
    }
    None
}

/// Drops `.` components so `./corpus/a` and `corpus/a` compare equal.
fn lexical(path: &Path) -> PathBuf {
    path.components().filter(|c| *c != Component::CurDir).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_the_root() {
        let root = Path::new("./corpus");
        assert_eq!(corpus_relative(root, Path::new("corpus/a/b.TextGrid")), Some(PathBuf::from("a/b.TextGrid")));
        assert_eq!(corpus_relative(root, Path::new("a/b.TextGrid")), Some(PathBuf::from("a/b.TextGrid")));
        assert_eq!(corpus_relative(root, Path::new("../elsewhere/b.TextGrid")), None);
    }

    #[test]
    fn marked_output_is_refused_as_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("changed");
        mark_output_root(&out).unwrap();
        let options = ReplayOptions {
            changed_root: dir.path().join("other"),
            global_root: dir.path().join("other_global"),
            annotation_subdir: None,
            pattern: PatternMode::Literal,
        };
        assert!(matches!(ensure_pristine(&out, &options), Err(SpellerError::ModifiedCorpus(_))));
        assert!(ensure_pristine(dir.path(), &options).is_ok());
    }
}
