// File: src/core/cluster.rs
use crate::config::MatchLimits;
use crate::core::similarity::rank;
use crate::core::types::{WordCluster, WordType};
use crate::core::vocabulary::VocabularyIndex;
use crate::error::{Result, SpellerError};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// The review queue: clusters in the order they should be reviewed.
#[derive(Debug, Clone, Default)]
pub struct ClusterQueue {
    clusters: Vec<WordCluster>,
    /// Mandatory words that do not occur among the reviewable types.
    ignored_mandatory: Vec<String>,
}

impl ClusterQueue {
    pub fn clusters(&self) -> &[WordCluster] {
        &self.clusters
    }

    pub fn get(&self, index: usize) -> Option<&WordCluster> {
        self.clusters.get(index)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn ignored_mandatory(&self) -> &[String] {
        &self.ignored_mandatory
    }
}

/// Greedily partitions the vocabulary into clusters of similar types.
///
/// Types are visited by descending priority (mandatory words first, in list
/// order). Each still-unassigned type anchors a new cluster and sweeps up its
/// closest matches from the unassigned pool, so a high-priority word is never
/// absorbed by a lower-priority one.
pub fn build_queue(vocab: &VocabularyIndex, mandatory: &[String], limits: MatchLimits) -> Result<ClusterQueue> {
    info!("Prioritising {} word types.", vocab.type_count());
    let (order, ignored_mandatory) = priority_order(vocab, mandatory);

    let mut pool: BTreeSet<String> = vocab.types().map(str::to_string).collect();
    let mut clusters = Vec::new();
    for anchor in order {
        if pool.is_empty() {
            break;
        }
        if !pool.remove(&anchor.text) {
            continue;
        }
        clusters.push(form_cluster(anchor, &mut pool, vocab, limits));
    }

    verify_partition(&clusters, vocab.type_count())?;
    info!("Formed {} word sets.", clusters.len());
    Ok(ClusterQueue { clusters, ignored_mandatory })
}

/// All types by descending priority, ties in lexical order, with the
/// mandatory words moved to the front in their list order.
fn priority_order(vocab: &VocabularyIndex, mandatory: &[String]) -> (Vec<WordType>, Vec<String>) {
    let mut order: Vec<WordType> = vocab.word_types().collect();
    // word_types() is lexical, and the sort is stable.
    order.sort_by_key(|w| std::cmp::Reverse(w.priority()));

    let mut ignored = Vec::new();
    for word in mandatory.iter().rev() {
        match order.iter().position(|w| &w.text == word) {
            Some(pos) => {
                let promoted = order.remove(pos);
                order.insert(0, promoted);
            }
            None => {
                warn!("The mandatory word \"{word}\" does not occur in the corpus. Ignoring it.");
                ignored.push(word.clone());
            }
        }
    }
    ignored.reverse();
    (order, ignored)
}

/// Builds one cluster around `anchor`, which must already be out of `pool`.
/// Every member taken into the cluster is removed from `pool`.
fn form_cluster(anchor: WordType, pool: &mut BTreeSet<String>, vocab: &VocabularyIndex, limits: MatchLimits) -> WordCluster {
    let matches = rank(&anchor.text, pool.iter(), limits.ratio_threshold, limits.max_alternatives);
    let mut alternatives = Vec::with_capacity(matches.len());
    for pair in matches {
        if pool.remove(&pair.word) {
            if let Some(word_type) = vocab.word_type(&pair.word) {
                alternatives.push(word_type);
            }
        }
    }
    debug!("Word set for \"{}\": {} alternatives", anchor.text, alternatives.len());
    WordCluster::new(alternatives, anchor)
}

fn verify_partition(clusters: &[WordCluster], expected: usize) -> Result<()> {
    let assigned: usize = clusters.iter().map(WordCluster::len).sum();
    let distinct: BTreeSet<&str> = clusters
        .iter()
        .flat_map(|c| c.members().iter().map(|m| m.text.as_str()))
        .collect();
    if assigned != expected || distinct.len() != expected {
        return Err(SpellerError::ConsistencyFault { assigned: distinct.len().min(assigned), expected });
    }
    Ok(())
}
