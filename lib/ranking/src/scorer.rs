//! Hybrid scorer
//!
//! Combines vector similarity with bounded contextual boosts into one
//! additive score per candidate, keeping the per-term breakdown for
//! explanations.

use blueprint_core::hashing::{fingerprint64, unit_interval};
use blueprint_core::{
    mentions_industry, Corpus, EmbeddingIndex, LexicalIndex, PageRole, QueryTokens, TemplateEntry,
    Vector, LEXICAL_SCORE_CAP,
};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Additive boost weights. Every term is bounded independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Added when the query industry appears in an entry's tags or industries
    pub industry_boost: f64,
    /// Added when images are wanted and the schema has an image-like slot
    pub image_boost: f64,
    /// Added when the role hint equals the entry's page role
    pub role_boost: f64,
    /// Ceiling for the lexical overlap term
    pub lexical_cap: f64,
    /// Jitter lies in `[0, jitter_scale)`
    pub jitter_scale: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            industry_boost: 0.2,
            image_boost: 0.1,
            role_boost: 0.2,
            lexical_cap: LEXICAL_SCORE_CAP,
            jitter_scale: 1e-5,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("industry_boost", self.industry_boost),
            ("image_boost", self.image_boost),
            ("role_boost", self.role_boost),
            ("lexical_cap", self.lexical_cap),
            ("jitter_scale", self.jitter_scale),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a finite, non-negative number"));
            }
        }
        if self.jitter_scale >= 1e-4 {
            return Err("jitter_scale must stay below 1e-4".to_string());
        }
        Ok(())
    }
}

/// Read-only view over the three per-corpus structures, aligned by ordinal
#[derive(Debug, Clone, Copy)]
pub struct IndexView<'a> {
    pub corpus: &'a Corpus,
    pub embeddings: &'a EmbeddingIndex,
    pub lexical: &'a LexicalIndex,
}

impl<'a> IndexView<'a> {
    pub fn new(corpus: &'a Corpus, embeddings: &'a EmbeddingIndex, lexical: &'a LexicalIndex) -> Self {
        Self {
            corpus,
            embeddings,
            lexical,
        }
    }
}

/// Everything about a query that scoring needs, computed once per call
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub text: String,
    pub vector: Vector,
    pub tokens: QueryTokens,
    /// Lowercased, trimmed
    pub industry: String,
    pub need_images: bool,
}

impl QueryContext {
    pub fn new(text: &str, vector: Vector, industry: &str, need_images: bool) -> Self {
        Self {
            text: text.to_string(),
            tokens: QueryTokens::new(text),
            vector,
            industry: industry.trim().to_lowercase(),
            need_images,
        }
    }
}

/// Per-term contributions to a hybrid score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub vector: f64,
    pub industry: f64,
    pub image: f64,
    pub role: f64,
    pub lexical: f64,
    pub jitter: f64,
    pub total: f64,
}

/// A scored view of one corpus entry
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub ordinal: usize,
    pub entry: &'a TemplateEntry,
    pub embedding: &'a Vector,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub role: Option<PageRole>,
}

/// Deterministic tie-break offset in `[0, scale)`: a pure function of its
/// inputs, identical across runs and hosts.
pub fn jitter(role: &str, industry: &str, query: &str, ordinal: usize, scale: f64) -> f64 {
    let ordinal = ordinal.to_string();
    let hash = fingerprint64(&["jitter-v1", role, industry, query, ordinal.as_str()]);
    unit_interval(hash) * scale
}

/// Orders candidates by score descending, then ordinal ascending
pub fn sort_candidates(candidates: &mut [ScoredCandidate<'_>]) {
    candidates.sort_by(|a, b| {
        OrderedFloat(b.score)
            .cmp(&OrderedFloat(a.score))
            .then(a.ordinal.cmp(&b.ordinal))
    });
}

#[derive(Debug, Clone, Copy)]
pub struct HybridScorer<'a> {
    view: IndexView<'a>,
    weights: ScoreWeights,
}

impl<'a> HybridScorer<'a> {
    pub fn new(view: IndexView<'a>, weights: ScoreWeights) -> Self {
        Self { view, weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Total over any ordinal; absent data contributes nothing
    pub fn score(&self, ordinal: usize, query: &QueryContext, role_hint: Option<PageRole>) -> f64 {
        self.breakdown(ordinal, query, role_hint).total
    }

    pub fn breakdown(
        &self,
        ordinal: usize,
        query: &QueryContext,
        role_hint: Option<PageRole>,
    ) -> ScoreBreakdown {
        let Some(entry) = self.view.corpus.get(ordinal) else {
            return ScoreBreakdown::default();
        };
        let w = &self.weights;

        let vector = self
            .view
            .embeddings
            .vector(ordinal)
            .map(|v| f64::from(v.cosine_similarity(&query.vector)))
            .unwrap_or(0.0);

        let industry = if !query.industry.is_empty()
            && entry.labels().any(|label| mentions_industry(label, &query.industry))
        {
            w.industry_boost
        } else {
            0.0
        };

        let image = if query.need_images && entry.has_image_slot() {
            w.image_boost
        } else {
            0.0
        };

        let role = match role_hint {
            Some(hint) if hint == entry.page_role => w.role_boost,
            _ => 0.0,
        };

        let lexical = self
            .view
            .lexical
            .score(&query.tokens, ordinal)
            .min(w.lexical_cap);

        let role_key = role_hint.map(|r| r.as_str()).unwrap_or("");
        let jitter = jitter(role_key, &query.industry, &query.text, ordinal, w.jitter_scale);

        ScoreBreakdown {
            vector,
            industry,
            image,
            role,
            lexical,
            jitter,
            total: vector + industry + image + role + lexical + jitter,
        }
    }

    /// Score a pool of ordinals, best first. Ordinals without an embedding
    /// are dropped.
    pub fn score_pool<I>(
        &self,
        ordinals: I,
        query: &QueryContext,
        role_hint: Option<PageRole>,
    ) -> Vec<ScoredCandidate<'a>>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut scored: Vec<ScoredCandidate<'a>> = ordinals
            .into_iter()
            .filter_map(|ordinal| {
                let entry = self.view.corpus.get(ordinal)?;
                let embedding = self.view.embeddings.vector(ordinal)?;
                let breakdown = self.breakdown(ordinal, query, role_hint);
                Some(ScoredCandidate {
                    ordinal,
                    entry,
                    embedding,
                    score: breakdown.total,
                    breakdown,
                    role: role_hint,
                })
            })
            .collect();

        sort_candidates(&mut scored);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Corpus where every entry has the same embedding, so only boosts differ
    fn flat_view(entries: Vec<TemplateEntry>) -> (Corpus, EmbeddingIndex, LexicalIndex) {
        let corpus = Corpus::from_entries(entries);
        let vectors = vec![Vector::new(vec![1.0, 0.0]); corpus.len()];
        let embeddings = EmbeddingIndex::from_vectors(2, vectors).unwrap();
        let lexical = LexicalIndex::build(&corpus);
        (corpus, embeddings, lexical)
    }

    fn query(text: &str, industry: &str, need_images: bool) -> QueryContext {
        QueryContext::new(text, Vector::new(vec![1.0, 0.0]), industry, need_images)
    }

    fn hero_scenario() -> Vec<TemplateEntry> {
        vec![
            TemplateEntry::new("Hero", PageRole::Hero).with_industries(["restaurant"]),
            TemplateEntry::new("Hero", PageRole::Hero).with_tags(["general"]),
            TemplateEntry::new("Hero", PageRole::Hero).with_industries(["tech"]),
        ]
    }

    #[test]
    fn test_score_is_pure() {
        let (corpus, embeddings, lexical) = flat_view(hero_scenario());
        let scorer = HybridScorer::new(IndexView::new(&corpus, &embeddings, &lexical), ScoreWeights::default());
        let q = query("cozy bistro hero", "restaurant", true);
        for ordinal in 0..3 {
            let a = scorer.score(ordinal, &q, Some(PageRole::Hero));
            let b = scorer.score(ordinal, &q, Some(PageRole::Hero));
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_industry_boost_ranks_matching_entry_first() {
        let (corpus, embeddings, lexical) = flat_view(hero_scenario());
        let scorer = HybridScorer::new(IndexView::new(&corpus, &embeddings, &lexical), ScoreWeights::default());
        let q = query("hero", "restaurant", false);

        let restaurant = scorer.breakdown(0, &q, Some(PageRole::Hero));
        let general = scorer.breakdown(1, &q, Some(PageRole::Hero));
        let tech = scorer.breakdown(2, &q, Some(PageRole::Hero));
        assert_eq!(restaurant.industry, 0.2);
        assert_eq!(tech.industry, 0.0);
        assert!(restaurant.total > tech.total);
        // "general" gets no boost but stays within jitter+lexical of the tech entry
        assert!((general.total - tech.total).abs() < 0.2);
    }

    #[test]
    fn test_industry_boost_is_case_insensitive() {
        let (corpus, embeddings, lexical) =
            flat_view(vec![TemplateEntry::new("Menu", PageRole::CoreContent).with_tags(["Restaurant"])]);
        let scorer = HybridScorer::new(IndexView::new(&corpus, &embeddings, &lexical), ScoreWeights::default());
        assert_eq!(scorer.breakdown(0, &query("menu", "restaurant", false), None).industry, 0.2);
        assert_eq!(scorer.breakdown(0, &query("menu", "RESTAURANT ", false), None).industry, 0.2);
    }

    #[test]
    fn test_image_and_role_boosts() {
        let (corpus, embeddings, lexical) = flat_view(vec![
            TemplateEntry::new("Gallery", PageRole::Media).with_schema_key("images", json!("array")),
            TemplateEntry::new("FAQ", PageRole::CoreContent).with_schema_key("items", json!("array")),
        ]);
        let scorer = HybridScorer::new(IndexView::new(&corpus, &embeddings, &lexical), ScoreWeights::default());

        let wants = query("photos", "", true);
        assert_eq!(scorer.breakdown(0, &wants, None).image, 0.1);
        assert_eq!(scorer.breakdown(1, &wants, None).image, 0.0);
        let skips = query("photos", "", false);
        assert_eq!(scorer.breakdown(0, &skips, None).image, 0.0);

        assert_eq!(scorer.breakdown(0, &wants, Some(PageRole::Media)).role, 0.2);
        assert_eq!(scorer.breakdown(0, &wants, Some(PageRole::Hero)).role, 0.0);
        assert_eq!(scorer.breakdown(0, &wants, None).role, 0.0);
    }

    #[test]
    fn test_jitter_is_tiny_and_deterministic() {
        for ordinal in 0..200 {
            let j = jitter("hero", "restaurant", "cozy", ordinal, 1e-5);
            assert!((0.0..1e-4).contains(&j));
            assert_eq!(j.to_bits(), jitter("hero", "restaurant", "cozy", ordinal, 1e-5).to_bits());
        }
        assert_ne!(jitter("hero", "x", "q", 1, 1e-5), jitter("hero", "x", "q", 2, 1e-5));
    }

    #[test]
    fn test_missing_ordinal_scores_zero() {
        let (corpus, embeddings, lexical) = flat_view(hero_scenario());
        let scorer = HybridScorer::new(IndexView::new(&corpus, &embeddings, &lexical), ScoreWeights::default());
        assert_eq!(scorer.breakdown(42, &query("x", "", false), None), ScoreBreakdown::default());
    }

    #[test]
    fn test_score_pool_sorted_best_first() {
        let (corpus, embeddings, lexical) = flat_view(hero_scenario());
        let scorer = HybridScorer::new(IndexView::new(&corpus, &embeddings, &lexical), ScoreWeights::default());
        let pool = scorer.score_pool(0..3, &query("hero", "restaurant", false), Some(PageRole::Hero));
        assert_eq!(pool.len(), 3);
        assert_eq!(pool[0].ordinal, 0);
        assert!(pool.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(pool.iter().all(|c| c.role == Some(PageRole::Hero)));
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoreWeights::default().validate().is_ok());
        let bad = ScoreWeights {
            role_boost: -1.0,
            ..ScoreWeights::default()
        };
        assert!(bad.validate().is_err());
        let loud = ScoreWeights {
            jitter_scale: 0.5,
            ..ScoreWeights::default()
        };
        assert!(loud.validate().is_err());
    }
}
