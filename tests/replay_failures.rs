mod common;

use common::{files_under, put, textgrid};
use speller_core::config::{InputFormat, PatternMode};
use speller_core::corpus::encoding::TextEncoding;
use speller_core::corpus::{CorpusAccessor, DirectoryCorpus};
use speller_core::error::{ErrorKind, SpellerError};
use speller_core::replay::{apply_log, ReplayOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn options(root: &Path, pattern: PatternMode) -> ReplayOptions {
    ReplayOptions {
        changed_root: root.join("out/changed"),
        global_root: root.join("out/global"),
        annotation_subdir: None,
        pattern,
    }
}

fn write_log(root: &Path, lines: &[String]) -> PathBuf {
    let path = root.join("logfile.txt");
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

#[test]
fn missing_log_is_reported_as_not_found() {
    let temp = tempdir().unwrap();
    let corpus = DirectoryCorpus::new(temp.path(), InputFormat::Textgrid);
    let err = apply_log(&temp.path().join("nope.txt"), &corpus, &options(temp.path(), PatternMode::Literal))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!err.is_fatal());
}

#[test]
fn bad_records_are_skipped_and_the_rest_still_apply() {
    let temp = tempdir().unwrap();
    let corpus_root = temp.path().join("corpus");
    put(&corpus_root, "good.TextGrid", textgrid(&["a teh b", "second exampel"]));
    let log = write_log(
        temp.path(),
        &[
            "2026-10-17T09:00:00.000Z :Session \"Starting\"".to_string(),
            "2026-10-17T09:00:01.000Z :Change \"teh\" in file \"missing.TextGrid\" interval 1 instance 1 to \"the\"".to_string(),
            "2026-10-17T09:00:02.000Z :Change \"teh\" in file \"good.TextGrid\" interval 9 instance 1 to \"the\"".to_string(),
            "2026-10-17T09:00:03.000Z :Change \"teh\" in file \"good.TextGrid\" interval 1 instance 2 to \"the\"".to_string(),
            "2026-10-17T09:00:04.000Z :Change \"teh\" garbled".to_string(),
            "2026-10-17T09:00:05.000Z :Change \"exampel\" in file \"good.TextGrid\" interval 2 instance 1 to \"example\"".to_string(),
            "2026-10-17T09:00:06.000Z :Note \"teh\" in file \"good.TextGrid\" interval 1 instance 1 says \"fine\"".to_string(),
        ],
    );
    let corpus = DirectoryCorpus::new(&corpus_root, InputFormat::Textgrid);
    let opts = options(temp.path(), PatternMode::Literal);

    let summary = apply_log(&log, &corpus, &opts).unwrap();
    assert_eq!(summary.applied, 1);
    let mut skipped_lines: Vec<usize> = summary.skipped.iter().map(|s| s.line).collect();
    skipped_lines.sort();
    assert_eq!(skipped_lines, vec![2, 3, 4, 5]);

    let written = fs::read_to_string(opts.changed_root.join("good.TextGrid")).unwrap();
    assert!(written.contains("text = \"a teh b\""));
    assert!(written.contains("text = \"second example\""));
}

#[test]
fn replaying_onto_previous_output_is_refused() {
    let temp = tempdir().unwrap();
    let corpus_root = temp.path().join("corpus");
    put(&corpus_root, "rec.TextGrid", textgrid(&["teh"]));
    let log = write_log(temp.path(), &["ts :Globally \"teh\" to \"the\"".to_string()]);
    let opts = options(temp.path(), PatternMode::Literal);

    let corpus = DirectoryCorpus::new(&corpus_root, InputFormat::Textgrid);
    assert_eq!(apply_log(&log, &corpus, &opts).unwrap().applied, 1);

    let second_opts = options(&temp.path().join("again"), PatternMode::Literal);
    let output_as_corpus = DirectoryCorpus::new(&opts.global_root, InputFormat::Textgrid);
    let err = apply_log(&log, &output_as_corpus, &second_opts).unwrap_err();
    assert!(matches!(err, SpellerError::ModifiedCorpus(_)));
    assert!(err.is_fatal());
}

#[test]
fn literal_and_regex_global_patterns_differ() {
    let temp = tempdir().unwrap();
    let corpus_root = temp.path().join("corpus");
    put(&corpus_root, "rec.TextGrid", textgrid(&["colour color colr"]));
    let log = write_log(temp.path(), &["ts :Globally \"colou?r\" to \"colour\"".to_string()]);
    let corpus = DirectoryCorpus::new(&corpus_root, InputFormat::Textgrid);

    let literal = options(&temp.path().join("lit"), PatternMode::Literal);
    let summary = apply_log(&log, &corpus, &literal).unwrap();
    assert_eq!(summary.applied, 0);
    assert_eq!(summary.skipped.len(), 1);
    assert!(files_under(&literal.global_root).is_empty());

    let regex = options(&temp.path().join("re"), PatternMode::Regex);
    let summary = apply_log(&log, &corpus, &regex).unwrap();
    assert_eq!(summary.applied, 1);
    let written = fs::read_to_string(regex.global_root.join("rec.TextGrid")).unwrap();
    assert!(written.contains("text = \"colour colour colr\""));
}

#[test]
fn global_changes_respect_the_annotation_subtree() {
    let temp = tempdir().unwrap();
    let corpus_root = temp.path().join("corpus");
    put(&corpus_root, "textgrids/a.TextGrid", textgrid(&["teh"]));
    put(&corpus_root, "scratch/b.TextGrid", textgrid(&["teh"]));
    let log = write_log(temp.path(), &["ts :Globally \"teh\" to \"the\"".to_string()]);
    let corpus = DirectoryCorpus::new(&corpus_root, InputFormat::Textgrid);
    let mut opts = options(temp.path(), PatternMode::Literal);
    opts.annotation_subdir = Some(PathBuf::from("textgrids"));

    let summary = apply_log(&log, &corpus, &opts).unwrap();
    assert_eq!(summary.applied, 1);
    assert_eq!(files_under(&opts.global_root), vec![PathBuf::from("textgrids/a.TextGrid")]);
}

#[test]
fn missing_annotation_subtree_skips_only_the_global_records() {
    let temp = tempdir().unwrap();
    let corpus_root = temp.path().join("corpus");
    put(&corpus_root, "rec.TextGrid", textgrid(&["a teh b"]));
    let log = write_log(
        temp.path(),
        &[
            "ts :Change \"teh\" in file \"rec.TextGrid\" interval 1 instance 1 to \"the\"".to_string(),
            "ts :Globally \"teh\" to \"the\"".to_string(),
        ],
    );
    let corpus = DirectoryCorpus::new(&corpus_root, InputFormat::Textgrid);
    let mut opts = options(temp.path(), PatternMode::Literal);
    opts.annotation_subdir = Some(PathBuf::from("textgrids"));

    let summary = apply_log(&log, &corpus, &opts).unwrap();
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].line, 2);
    assert!(summary.skipped[0].reason.contains("not found"));
    assert_eq!(files_under(&opts.changed_root), vec![PathBuf::from("rec.TextGrid")]);
    assert!(files_under(&opts.global_root).is_empty());
}

#[test]
fn bomless_utf16_is_replayed_byte_for_byte() {
    let temp = tempdir().unwrap();
    let corpus_root = temp.path().join("corpus");
    let original = textgrid(&["an exampel here"]);
    let le = |text: &str| -> Vec<u8> { text.encode_utf16().flat_map(u16::to_le_bytes).collect() };
    put(&corpus_root, "rec.TextGrid", le(&original));
    let log = write_log(
        temp.path(),
        &["ts :Change \"exampel\" in file \"rec.TextGrid\" interval 1 instance 1 to \"example\"".to_string()],
    );
    let corpus = DirectoryCorpus::new(&corpus_root, InputFormat::Textgrid);
    let opts = options(temp.path(), PatternMode::Literal);

    assert_eq!(apply_log(&log, &corpus, &opts).unwrap().applied, 1);
    let written = fs::read(opts.changed_root.join("rec.TextGrid")).unwrap();
    assert_eq!(written, le(&original.replace("an exampel here", "an example here")));
}

#[test]
fn forced_utf8_keeps_an_existing_bom() {
    let temp = tempdir().unwrap();
    let corpus_root = temp.path().join("corpus");
    let original = textgrid(&["colr"]);
    put(&corpus_root, "rec.TextGrid", TextEncoding::Utf8Bom.encode(&original));
    let log = write_log(temp.path(), &["ts :Globally \"colr\" to \"color\"".to_string()]);
    let corpus = DirectoryCorpus::new(&corpus_root, InputFormat::Textgrid).with_encoding(Some(TextEncoding::Utf8));
    let opts = options(temp.path(), PatternMode::Literal);

    assert_eq!(apply_log(&log, &corpus, &opts).unwrap().applied, 1);
    let written = fs::read(opts.global_root.join("rec.TextGrid")).unwrap();
    assert_eq!(written, TextEncoding::Utf8Bom.encode(&original.replace("colr", "color")));
}

#[test]
fn global_corrections_with_quotes_keep_the_textgrid_valid() {
    let temp = tempdir().unwrap();
    let corpus_root = temp.path().join("corpus");
    put(&corpus_root, "rec.TextGrid", textgrid(&["a teh b"]));
    let log = write_log(temp.path(), &["ts :Globally \"teh\" to \"t\\\"he\"".to_string()]);
    let corpus = DirectoryCorpus::new(&corpus_root, InputFormat::Textgrid);
    let opts = options(temp.path(), PatternMode::Literal);

    assert_eq!(apply_log(&log, &corpus, &opts).unwrap().applied, 1);
    let target = opts.global_root.join("rec.TextGrid");
    assert!(fs::read_to_string(&target).unwrap().contains("text = \"a t\"\"he b\""));
    let copy = DirectoryCorpus::new(&opts.global_root, InputFormat::Textgrid);
    assert_eq!(copy.list_intervals(&target).unwrap(), vec!["a t\"he b".to_string()]);
}
