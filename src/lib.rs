//! # Blueprint
//!
//! Component-template retrieval: given a free-text business description, an
//! industry and a set of page roles, pick a small, non-redundant,
//! role-balanced slate of reusable UI-component blueprints from a fixed
//! corpus.
//!
//! Ranking is a hybrid of exact cosine similarity and bounded contextual
//! boosts (industry, image slots, role fit, keyword overlap), broken
//! deterministically on ties and diversified with Maximal Marginal Relevance.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! blueprint --corpus ./data/components.jsonl compose cozy trattoria --industry restaurant
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use blueprint::prelude::*;
//! use std::sync::Arc;
//!
//! let corpus = Corpus::from_entries(vec![
//!     TemplateEntry::new("Hero", PageRole::Hero).with_industries(["restaurant"]),
//!     TemplateEntry::new("Pricing", PageRole::Conversion).with_tags(["saas"]),
//! ]);
//! let engine = RetrievalEngine::from_corpus(
//!     corpus,
//!     EngineConfig::default(),
//!     Arc::new(HashingEmbedder::default()),
//! )
//! .unwrap();
//!
//! let request = ComposeRequest::new(["cozy trattoria"])
//!     .with_industry("restaurant")
//!     .with_roles(["hero", "conversion"]);
//! let slate = engine.retrieve_by_roles(&request).unwrap();
//! assert_eq!(slate.for_role("hero").len(), 1);
//! assert!(slate.for_role("conversion").is_empty());
//! ```
//!
//! ## Crate Structure
//!
//! - `blueprint-core` - Entries, roles, corpus loading, embedder, embedding and lexical indexes
//! - `blueprint-ranking` - Hybrid scorer, MMR, slate composition, flat retrieval, explain traces
//! - `blueprint-storage` - Index artifact persistence and the shared `RetrievalEngine`

// Re-export core types
pub use blueprint_core::{
    Corpus, Embedder, EmbeddingIndex, Error, HashingEmbedder, LexicalIndex, LoadReport, PageRole,
    RecordWarning, Result, TemplateEntry, Vector,
};

// Re-export ranking
pub use blueprint_ranking::{
    ComposeRequest, Composer, ComposerConfig, FlatRetriever, MmrConfig, RetrievalTrace,
    ScoreBreakdown, ScoreWeights, SelectedTemplate, Slate,
};

// Re-export storage
pub use blueprint_storage::{EngineConfig, EngineInfo, IndexSource, RetrievalEngine};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ComposeRequest, Corpus, Embedder, EngineConfig, Error, HashingEmbedder, PageRole, Result,
        RetrievalEngine, ScoreWeights, Slate, TemplateEntry, Vector,
    };
}

/// SIMD-optimized vector operations
pub mod simd {
    pub use blueprint_core::simd::{dot_product_simd, norm_simd};
}
