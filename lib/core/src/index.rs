//! Exact nearest-neighbour index over unit-length embeddings.
//!
//! Vectors sit at the same ordinal as their entry in the [`Corpus`]. Corpora
//! here are small (hundreds to low thousands of blueprints), so a flat scan
//! gives exact results at negligible cost and no approximation to tune.

use crate::corpus::Corpus;
use crate::embedder::{checked_embedding, Embedder};
use crate::{Error, Result, Vector};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::Serialize;

/// One nearest-neighbour hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub ordinal: usize,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingIndex {
    dim: usize,
    vectors: Vec<Vector>,
}

impl EmbeddingIndex {
    /// Embed every corpus entry. Runs the embedder in parallel; any single
    /// failure fails the whole build.
    pub fn build(corpus: &Corpus, embedder: &dyn Embedder) -> Result<Self> {
        let vectors = corpus
            .texts()
            .par_iter()
            .map(|text| checked_embedding(embedder, text))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dim: embedder.dim(),
            vectors,
        })
    }

    /// Rebuild from previously persisted vectors
    pub fn from_vectors(dim: usize, vectors: Vec<Vector>) -> Result<Self> {
        if let Some(bad) = vectors.iter().find(|v| v.dim() != dim) {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: bad.dim(),
            });
        }
        Ok(Self { dim, vectors })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[inline]
    pub fn vector(&self, ordinal: usize) -> Option<&Vector> {
        self.vectors.get(ordinal)
    }

    #[inline]
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    /// Top `k` ordinals by cosine similarity, descending; equal similarities
    /// keep ordinal order
    pub fn nearest_neighbors(&self, query: &Vector, k: usize) -> Vec<Neighbor> {
        if k == 0 || query.dim() != self.dim {
            return Vec::new();
        }

        let mut hits: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(ordinal, v)| Neighbor {
                ordinal,
                similarity: v.cosine_similarity(query),
            })
            .collect();

        hits.sort_by(|a, b| {
            OrderedFloat(b.similarity)
                .cmp(&OrderedFloat(a.similarity))
                .then(a.ordinal.cmp(&b.ordinal))
        });
        hits.truncate(k);
        hits
    }
}
