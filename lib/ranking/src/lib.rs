//! # Blueprint Ranking
//!
//! Query-time ranking on top of the indexes in `blueprint-core`.
//!
//! ## Features
//!
//! - **Hybrid scoring**: cosine similarity plus bounded industry, image,
//!   role and lexical boosts, with a deterministic tie-break jitter
//! - **MMR diversification**: greedy relevance/redundancy trade-off
//! - **Role-bucketed composition**: one balanced slate per page, with
//!   aggregated image keywords and per-type prop defaults
//! - **Flat retrieval**: a single ranked pool for role-agnostic consumers
//! - **Explainability**: per-candidate score breakdowns
//!
//! ## Example
//!
//! ```rust
//! use blueprint_core::{Corpus, Embedder, EmbeddingIndex, HashingEmbedder, LexicalIndex, PageRole, TemplateEntry};
//! use blueprint_ranking::{ComposeRequest, Composer, ComposerConfig, IndexView};
//!
//! let corpus = Corpus::from_entries(vec![
//!     TemplateEntry::new("Hero", PageRole::Hero).with_industries(["restaurant"]),
//!     TemplateEntry::new("Footer", PageRole::Footer).with_tags(["general"]),
//! ]);
//! let embedder = HashingEmbedder::new(64).unwrap();
//! let embeddings = EmbeddingIndex::build(&corpus, &embedder).unwrap();
//! let lexical = LexicalIndex::build(&corpus);
//!
//! let composer = Composer::new(IndexView::new(&corpus, &embeddings, &lexical), ComposerConfig::default());
//! let request = ComposeRequest::new(["cozy trattoria"]).with_industry("restaurant");
//! let query = embedder.embed(&request.query_text()).unwrap();
//!
//! let slate = composer.compose(&request, &query);
//! assert_eq!(slate.for_role("hero").len(), 1);
//! assert!(slate.for_role("conversion").is_empty());
//! ```

pub mod compose;
pub mod explain;
pub mod flat;
pub mod mmr;
pub mod rewrite;
pub mod scorer;

pub use compose::{
    merge_schema_defaults, ComposeRequest, Composer, ComposerConfig, RoleSelection, RoleSlot,
    SelectedTemplate, Slate, DEFAULT_IMAGE_KEYWORD_CAP, DEFAULT_K_PER_ROLE,
};
pub use explain::{CandidateTrace, RetrievalTrace, RoleTrace};
pub use flat::{FlatRetriever, DEFAULT_FLAT_RESULT_CAP};
pub use mmr::{MmrConfig, DEFAULT_LAMBDA};
pub use rewrite::{normalize_keywords, prepare_copy, IMAGE_URL_POLICY};
pub use scorer::{HybridScorer, IndexView, QueryContext, ScoreBreakdown, ScoreWeights, ScoredCandidate};
