// File: src/core/similarity.rs
use crate::core::types::SimilarityPair;

/// Normalized indel similarity: `(|a| + |b| - d) / (|a| + |b|)` where `d` is
/// the edit distance counting insertions and deletions only (a substitution
/// costs two). Equal to `2 * lcs / (|a| + |b|)`. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Length of the longest common subsequence, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];
    for &x in outer {
        for (j, &y) in inner.iter().enumerate() {
            curr[j + 1] = if x == y { prev[j] + 1 } else { prev[j + 1].max(curr[j]) };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[inner.len()]
}

/// Upper bound of `ratio` from lengths alone, used to skip hopeless candidates.
fn ratio_bound(a_len: usize, b_len: usize) -> f64 {
    let total = a_len + b_len;
    if total == 0 {
        return 1.0;
    }
    (2 * a_len.min(b_len)) as f64 / total as f64
}

/// Ranks `candidates` by similarity to `anchor`, most similar first, ties in
/// lexical order. The anchor itself is never returned.
///
/// With `min_ratio > 0` pairs below it are dropped. With `max_results = Some(k)`
/// the k-th highest *distinct* ratio becomes a cutoff and every pair at or above
/// it is kept, so a tie at the boundary can yield more than `k` results.
/// `Some(0)` means no limit.
pub fn rank<I, S>(anchor: &str, candidates: I, min_ratio: f64, max_results: Option<usize>) -> Vec<SimilarityPair>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let anchor_len = anchor.chars().count();
    let mut pairs: Vec<SimilarityPair> = candidates
        .into_iter()
        .filter(|c| c.as_ref() != anchor)
        .filter(|c| min_ratio <= 0.0 || ratio_bound(anchor_len, c.as_ref().chars().count()) >= min_ratio)
        .map(|c| SimilarityPair { word: c.as_ref().to_string(), ratio: ratio(anchor, c.as_ref()) })
        .filter(|p| min_ratio <= 0.0 || p.ratio >= min_ratio)
        .collect();

    pairs.sort_by(|a, b| b.ratio.total_cmp(&a.ratio).then_with(|| a.word.cmp(&b.word)));
    pairs.dedup_by(|a, b| a.word == b.word);

    if let Some(k) = max_results.filter(|&k| k > 0) {
        let mut distinct: Vec<f64> = pairs.iter().map(|p| p.ratio).collect();
        distinct.dedup();
        if distinct.len() > k {
            let cutoff = distinct[k - 1];
            pairs.retain(|p| p.ratio >= cutoff);
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(pairs: &[SimilarityPair]) -> Vec<&str> {
        pairs.iter().map(|p| p.word.as_str()).collect()
    }

    #[test]
    fn ratio_matches_indel_definition() {
        assert_eq!(ratio("example", "example"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", ""), 0.0);
        // lcs("exampel", "example") = 6
        assert!((ratio("exampel", "example") - 12.0 / 14.0).abs() < 1e-12);
        assert_eq!(ratio("kitten", "sitting"), ratio("sitting", "kitten"));
    }

    #[test]
    fn anchor_is_never_returned_and_threshold_holds() {
        let pool = ["house", "houses", "mouse", "zebra"];
        let ranked = rank("house", pool, 0.7, None);
        assert!(!words(&ranked).contains(&"house"));
        assert!(ranked.iter().all(|p| p.ratio >= 0.7));
        assert_eq!(words(&ranked), vec!["houses", "mouse"]);
    }

    #[test]
    fn ties_are_broken_lexically() {
        // Both differ from the anchor by one substitution.
        let ranked = rank("abcde", ["abcdz", "abcdy", "xbcde"], 0.0, None);
        assert_eq!(words(&ranked), vec!["abcdy", "abcdz", "xbcde"]);
    }

    #[test]
    fn max_results_keeps_every_pair_tied_at_the_cutoff() {
        // ratios: 18/19, 16/18, 16/18, 12/16
        let anchor = "abcdefghij";
        let candidates = ["abcdefghi", "abcdefgh", "bcdefghi", "abcdef"];
        let ranked = rank(anchor, candidates, 0.0, None);
        let ratios: Vec<f64> = ranked.iter().map(|p| p.ratio).collect();
        assert_eq!(ratios.len(), 4);
        assert!(ratios[1] == ratios[2] && ratios[0] > ratios[1] && ratios[2] > ratios[3]);

        let limited = rank(anchor, candidates, 0.0, Some(2));
        assert_eq!(words(&limited), vec!["abcdefghi", "abcdefgh", "bcdefghi"]);

        let one = rank(anchor, candidates, 0.0, Some(1));
        assert_eq!(words(&one), vec!["abcdefghi"]);

        let all = rank(anchor, candidates, 0.0, Some(10));
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn empty_candidates_yield_nothing() {
        assert!(rank("word", Vec::<String>::new(), 0.0, Some(3)).is_empty());
        assert!(rank("word", ["word"], 0.0, None).is_empty());
    }
}
