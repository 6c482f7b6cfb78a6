// Role-agnostic retrieval: one ranked pool for consumers that do not bucket
// by page role.

use crate::rewrite::prepare_copy;
use crate::scorer::{HybridScorer, IndexView, QueryContext, ScoreWeights};
use ahash::AHashSet;
use blueprint_core::{TemplateEntry, Vector};

pub const DEFAULT_FLAT_RESULT_CAP: usize = 18;

pub struct FlatRetriever<'a> {
    view: IndexView<'a>,
    weights: ScoreWeights,
    result_cap: usize,
}

impl<'a> FlatRetriever<'a> {
    pub fn new(view: IndexView<'a>, weights: ScoreWeights, result_cap: usize) -> Self {
        Self {
            view,
            weights,
            result_cap,
        }
    }

    /// Take the `k` nearest neighbours of `query_vector`, re-rank them with the
    /// hybrid score (no role hint) and return copies, best first. A `general`
    /// entry whose type already appeared is skipped. Output never exceeds the
    /// result cap; a blank query returns nothing.
    pub fn retrieve(
        &self,
        query_text: &str,
        query_vector: &Vector,
        industry: &str,
        need_images: bool,
        k: usize,
    ) -> Vec<TemplateEntry> {
        if query_text.trim().is_empty() || k == 0 {
            return Vec::new();
        }

        let query = QueryContext::new(query_text.trim(), query_vector.clone(), industry, need_images);
        let neighbors = self.view.embeddings.nearest_neighbors(query_vector, k);
        let scorer = HybridScorer::new(self.view, self.weights);
        let ranked = scorer.score_pool(neighbors.iter().map(|n| n.ordinal), &query, None);

        let mut seen_types: AHashSet<&str> = AHashSet::new();
        // The cap applies to the ranked pool; dropped repeats are not backfilled
        ranked
            .into_iter()
            .take(self.result_cap)
            .filter(|c| seen_types.insert(c.entry.kind.as_str()) || !c.entry.is_general())
            .map(|c| prepare_copy(c.entry, need_images))
            .collect()
    }
}
