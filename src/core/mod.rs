// File: src/core/mod.rs
pub mod cluster;
pub mod similarity;
pub mod types;
pub mod vocabulary;
pub mod worklist;

use crate::config::SpellerConfig;
use crate::corpus::CorpusAccessor;
use crate::error::Result;
use cluster::{build_queue, ClusterQueue};
use log::info;
use vocabulary::{collect_tokens, VocabularyIndex};

/// Everything computed once per run before the operator starts reviewing.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub vocab: VocabularyIndex,
    pub queue: ClusterQueue,
}

/// Counts the corpus vocabulary and builds the review queue.
pub fn analyze(corpus: &dyn CorpusAccessor, config: &SpellerConfig, mandatory: &[String]) -> Result<Analysis> {
    let tokens = collect_tokens(corpus, &config.tokens)?;
    info!("Calculating occurrence counts and word lengths.");
    let vocab = VocabularyIndex::build(tokens, config.min_word_length);
    let queue = build_queue(&vocab, mandatory, config.cluster)?;
    Ok(Analysis { vocab, queue })
}
