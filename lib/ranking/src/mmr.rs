//! Maximal Marginal Relevance selection
//!
//! Greedily picks candidates that are relevant to the query but not
//! redundant with what was already picked:
//!
//! ```text
//! mmr(c) = λ · score(c) − (1 − λ) · max_{s ∈ selected} cos(c, s)
//! ```
//!
//! λ = 1 reduces to plain top-n by score.

use crate::scorer::{sort_candidates, ScoredCandidate};

pub const DEFAULT_LAMBDA: f64 = 0.7;

/// Relevance/diversity trade-off and selection size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmrConfig {
    lambda: f64,
    top_n: usize,
}

impl Default for MmrConfig {
    fn default() -> Self {
        Self {
            lambda: DEFAULT_LAMBDA,
            top_n: 8,
        }
    }
}

impl MmrConfig {
    pub fn new(lambda: f64, top_n: usize) -> Self {
        Self::default().with_lambda(lambda).with_top_n(top_n)
    }

    /// Clamped to `[0, 1]`; NaN falls back to the default
    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = if lambda.is_nan() {
            DEFAULT_LAMBDA
        } else {
            lambda.clamp(0.0, 1.0)
        };
        self
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    #[inline]
    pub fn top_n(&self) -> usize {
        self.top_n
    }
}

/// Select `min(top_n, candidates.len())` distinct candidates in pick order.
///
/// Candidates are visited by score descending then ordinal ascending, and a
/// later candidate only wins with a strictly higher MMR value, so ties go to
/// the better-scored, lower-ordinal one.
pub fn select<'a>(mut candidates: Vec<ScoredCandidate<'a>>, config: MmrConfig) -> Vec<ScoredCandidate<'a>> {
    let target = config.top_n.min(candidates.len());
    if target == 0 {
        return Vec::new();
    }
    sort_candidates(&mut candidates);

    let lambda = config.lambda;
    let mut remaining: Vec<Option<ScoredCandidate<'a>>> = candidates.into_iter().map(Some).collect();
    // Highest similarity of each remaining candidate to anything selected
    let mut max_sim = vec![0.0f64; remaining.len()];
    let mut selected: Vec<ScoredCandidate<'a>> = Vec::with_capacity(target);

    while selected.len() < target {
        let mut best: Option<(usize, f64)> = None;
        for (i, slot) in remaining.iter().enumerate() {
            let Some(candidate) = slot else { continue };
            let redundancy = if selected.is_empty() { 0.0 } else { max_sim[i] };
            let value = lambda * candidate.score - (1.0 - lambda) * redundancy;
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((i, value)),
            }
        }

        let Some((pick, _)) = best else { break };
        let Some(chosen) = remaining[pick].take() else { break };

        let first = selected.is_empty();
        for (i, slot) in remaining.iter().enumerate() {
            if let Some(candidate) = slot {
                let sim = f64::from(candidate.embedding.cosine_similarity(chosen.embedding));
                max_sim[i] = if first { sim } else { max_sim[i].max(sim) };
            }
        }
        selected.push(chosen);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::ScoreBreakdown;
    use blueprint_core::{PageRole, TemplateEntry, Vector};

    struct Fixture {
        entries: Vec<TemplateEntry>,
        vectors: Vec<Vector>,
        scores: Vec<f64>,
    }

    impl Fixture {
        fn candidates(&self) -> Vec<ScoredCandidate<'_>> {
            self.scores
                .iter()
                .enumerate()
                .map(|(ordinal, &score)| ScoredCandidate {
                    ordinal,
                    entry: &self.entries[ordinal],
                    embedding: &self.vectors[ordinal],
                    score,
                    breakdown: ScoreBreakdown::default(),
                    role: None,
                })
                .collect()
        }
    }

    /// Ordinals 0 and 1 are near-duplicates; 2 points elsewhere
    fn clustered() -> Fixture {
        Fixture {
            entries: (0..3).map(|i| TemplateEntry::new(format!("T{i}"), PageRole::Value)).collect(),
            vectors: vec![
                Vector::new(vec![1.0, 0.0]),
                Vector::new(vec![0.99, 0.14]).normalized(),
                Vector::new(vec![0.0, 1.0]),
            ],
            scores: vec![0.9, 0.88, 0.6],
        }
    }

    fn ordinals(picked: &[ScoredCandidate<'_>]) -> Vec<usize> {
        picked.iter().map(|c| c.ordinal).collect()
    }

    #[test]
    fn test_lambda_one_is_top_n() {
        let f = clustered();
        let picked = select(f.candidates(), MmrConfig::new(1.0, 2));
        assert_eq!(ordinals(&picked), vec![0, 1]);
    }

    #[test]
    fn test_diversity_skips_near_duplicate() {
        let f = clustered();
        let picked = select(f.candidates(), MmrConfig::new(0.5, 2));
        assert_eq!(ordinals(&picked), vec![0, 2]);
    }

    #[test]
    fn test_size_is_min_of_pool_and_n() {
        let f = clustered();
        assert_eq!(select(f.candidates(), MmrConfig::new(0.7, 10)).len(), 3);
        assert_eq!(select(f.candidates(), MmrConfig::new(0.7, 1)).len(), 1);
        assert!(select(f.candidates(), MmrConfig::new(0.7, 0)).is_empty());
        assert!(select(Vec::new(), MmrConfig::default()).is_empty());
    }

    #[test]
    fn test_no_duplicates() {
        let f = clustered();
        let mut picked = ordinals(&select(f.candidates(), MmrConfig::new(0.3, 3)));
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_first_pick_is_best_score() {
        let f = clustered();
        for lambda in [0.0, 0.3, 0.7, 1.0] {
            let picked = select(f.candidates(), MmrConfig::new(lambda, 1));
            assert_eq!(picked[0].ordinal, 0, "lambda {lambda}");
        }
    }

    #[test]
    fn test_ties_prefer_lower_ordinal() {
        let f = Fixture {
            entries: (0..3).map(|i| TemplateEntry::new(format!("T{i}"), PageRole::Aux)).collect(),
            vectors: vec![Vector::new(vec![1.0, 0.0]); 3],
            scores: vec![0.5, 0.5, 0.5],
        };
        let mut candidates = f.candidates();
        candidates.reverse();
        assert_eq!(ordinals(&select(candidates, MmrConfig::new(0.7, 3))), vec![0, 1, 2]);
    }

    #[test]
    fn test_lambda_is_clamped() {
        assert_eq!(MmrConfig::default().with_lambda(2.0).lambda(), 1.0);
        assert_eq!(MmrConfig::default().with_lambda(-1.0).lambda(), 0.0);
        assert_eq!(MmrConfig::default().with_lambda(f64::NAN).lambda(), DEFAULT_LAMBDA);
    }
}
