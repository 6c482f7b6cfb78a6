//! # Blueprint Core
//!
//! Core data structures for the Blueprint retrieval engine.
//!
//! - [`TemplateEntry`] - One reusable UI-component blueprint
//! - [`PageRole`] - The page-slot taxonomy (header, hero, value, ...)
//! - [`Corpus`] - The immutable, ordinal-keyed set of entries loaded from JSONL
//! - [`Embedder`] / [`HashingEmbedder`] - Text to unit-vector conversion
//! - [`EmbeddingIndex`] - Exact cosine nearest-neighbour lookup by ordinal
//! - [`LexicalIndex`] - IDF statistics and the bounded keyword-overlap score
//!
//! ## Example
//!
//! ```rust
//! use blueprint_core::{Corpus, EmbeddingIndex, HashingEmbedder, Embedder, PageRole, TemplateEntry};
//!
//! let corpus = Corpus::from_entries(vec![
//!     TemplateEntry::new("Hero", PageRole::Hero).with_tags(["restaurant"]),
//!     TemplateEntry::new("Footer", PageRole::Footer).with_tags(["general"]),
//! ]);
//! let embedder = HashingEmbedder::new(64).unwrap();
//! let index = EmbeddingIndex::build(&corpus, &embedder).unwrap();
//!
//! let query = embedder.embed("restaurant hero").unwrap();
//! let hits = index.nearest_neighbors(&query, 1);
//! assert_eq!(hits.len(), 1);
//! ```

pub mod corpus;
pub mod embedder;
pub mod entry;
pub mod error;
pub mod filter;
pub mod hashing;
pub mod index;
pub mod lexical;
pub mod role;
pub mod vector;

/// SIMD-optimized vector operations
///
/// Provides hardware-accelerated dot products:
/// - AVX2/FMA on x86_64
/// - NEON on ARM64/Apple Silicon
pub mod simd;

pub use corpus::{Corpus, LoadReport, RecordWarning};
pub use embedder::{checked_embedding, Embedder, HashingEmbedder, DEFAULT_HASH_DIM};
pub use entry::{is_image_key, TemplateEntry};
pub use error::{Error, Result};
pub use filter::{fuzzy_mentions_industry, mentions_industry, AllOf, Filter, IndustryFilter, RoleFilter};
pub use hashing::{fingerprint64, FINGERPRINT_VERSION};
pub use index::{EmbeddingIndex, Neighbor};
pub use lexical::{LexicalIndex, QueryTokens, LEXICAL_SCORE_CAP};
pub use role::{PageRole, UnknownRole};
pub use vector::Vector;
