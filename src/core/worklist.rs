// File: src/core/worklist.rs
use crate::core::types::{Occurrence, Worklist};
use crate::corpus::CorpusAccessor;
use crate::error::Result;
use log::{info, warn};

/// Enumerates every occurrence of `word` in the corpus: files in listing
/// order, then intervals, then tokens. Sequence numbers count up from zero.
pub fn build_worklist(word: &str, corpus: &dyn CorpusAccessor) -> Result<Worklist> {
    info!("Building the worklist for \"{word}\".");
    let mut occurrences = Vec::new();
    for file in corpus.list_files()? {
        let intervals = match corpus.list_intervals(&file) {
            Ok(intervals) => intervals,
            Err(e) if !e.is_fatal() => {
                warn!("Skipping {}: {e}", file.display());
                continue;
            }
            Err(e) => return Err(e),
        };
        for (interval, text) in intervals.iter().enumerate() {
            let hits = text.split_whitespace().filter(|tok| *tok == word).count();
            for instance in 0..hits {
                occurrences.push(Occurrence {
                    sequence: occurrences.len(),
                    file: file.clone(),
                    interval,
                    instance,
                });
            }
        }
    }
    info!("Found {} occurrences of \"{word}\".", occurrences.len());
    Ok(Worklist::new(word.to_string(), occurrences))
}
