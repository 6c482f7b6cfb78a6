//! Text embedders.
//!
//! Production deployments plug in a sentence-embedding model behind the
//! [`Embedder`] trait. [`HashingEmbedder`] is the built-in, dependency-free
//! embedder: character trigrams and whole words are hashed into a fixed
//! number of buckets and the result is L2-normalized. It is deterministic
//! across processes, which makes it suitable for tests, benches and offline
//! use of the CLI.

use crate::hashing::fingerprint64;
use crate::{Error, Result, Vector};
use std::collections::BTreeSet;

/// Default dimension for the hashing embedder
pub const DEFAULT_HASH_DIM: usize = 256;

/// Converts text into a fixed-dimension, L2-normalized vector
pub trait Embedder: Send + Sync {
    /// Output dimension
    fn dim(&self) -> usize;

    /// Stable identifier of the model and its configuration. Persisted
    /// indexes built by a different embedder are discarded.
    fn id(&self) -> String;

    fn embed(&self, text: &str) -> Result<Vector>;
}

/// Check an embedder's output and normalize it
pub fn checked_embedding(embedder: &dyn Embedder, text: &str) -> Result<Vector> {
    let vector = embedder.embed(text)?;
    if vector.dim() != embedder.dim() {
        return Err(Error::InvalidDimension {
            expected: embedder.dim(),
            actual: vector.dim(),
        });
    }
    if vector.as_slice().iter().any(|x| !x.is_finite()) {
        return Err(Error::Embedding(format!(
            "{} produced a non-finite component",
            embedder.id()
        )));
    }
    Ok(vector.normalized())
}

/// Feature-hashing embedder over trigrams and words
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be > 0".to_string()));
        }
        Ok(Self { dim })
    }

    fn bucket(&self, kind: &str, feature: &str) -> usize {
        (fingerprint64(&[kind, feature]) % self.dim as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_HASH_DIM,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn id(&self) -> String {
        format!("hashing-trigram-v1/{}", self.dim)
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        let normalized = text.to_lowercase();
        let mut data = vec![0.0f32; self.dim];

        for trigram in trigrams(&normalized) {
            data[self.bucket("tri", &trigram)] += 1.0;
        }
        // Words carry more weight than the trigrams inside them
        for word in normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            data[self.bucket("word", word)] += 2.0;
        }

        let mut vector = Vector::new(data);
        vector.normalize();
        Ok(vector)
    }
}

/// Distinct character trigrams of each word, padded with spaces.
/// Sorted so bucket accumulation order never varies.
fn trigrams(text: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let padded: Vec<char> = format!(" {word} ").chars().collect();
        for window in padded.windows(3) {
            out.insert(window.iter().collect());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_vector() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let a = embedder.embed("Wood-fired pizza restaurant").unwrap();
        let b = embedder.embed("Wood-fired pizza restaurant").unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(a.dim(), 64);
        assert!(a.is_normalized());
    }

    #[test]
    fn test_related_text_is_closer() {
        let embedder = HashingEmbedder::default();
        let base = embedder.embed("restaurant menu with seasonal dishes").unwrap();
        let near = embedder.embed("seasonal restaurant menu").unwrap();
        let far = embedder.embed("cloud infrastructure automation").unwrap();
        assert!(base.cosine_similarity(&near) > base.cosine_similarity(&far));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16).unwrap();
        let v = embedder.embed("").unwrap();
        assert!(v.as_slice().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dim_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    struct WrongDim;

    impl Embedder for WrongDim {
        fn dim(&self) -> usize {
            4
        }
        fn id(&self) -> String {
            "wrong".to_string()
        }
        fn embed(&self, _text: &str) -> Result<Vector> {
            Ok(Vector::new(vec![1.0, 0.0]))
        }
    }

    #[test]
    fn test_checked_embedding_rejects_bad_dimension() {
        let err = checked_embedding(&WrongDim, "x").unwrap_err();
        assert!(matches!(err, Error::InvalidDimension { expected: 4, actual: 2 }));
    }
}
