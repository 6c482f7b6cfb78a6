// Persisted embedding-index artifact.
//
// One bincode file holding every entry vector plus enough metadata to tell
// whether it still matches the corpus and embedder it was built from. Writes
// go through atomicwrites so a crash never leaves a torn file behind.

use anyhow::{anyhow, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use blueprint_core::hashing::sha256_hex;
use blueprint_core::{EmbeddingIndex, Vector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bumped whenever the on-disk layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// What the engine expects a reusable artifact to describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactExpectation {
    pub embedder_id: String,
    pub dim: usize,
    pub entry_count: usize,
    pub corpus_fingerprint: u64,
}

/// Why an artifact cannot be reused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Incompatibility {
    #[error("format version {found}, expected {expected}")]
    FormatVersion { found: u32, expected: u32 },

    #[error("built by embedder {found}, expected {expected}")]
    Embedder { found: String, expected: String },

    #[error("dimension {found}, expected {expected}")]
    Dimension { found: usize, expected: usize },

    #[error("{found} entries, corpus has {expected}")]
    EntryCount { found: usize, expected: usize },

    #[error("corpus content changed since the artifact was written")]
    CorpusChanged,

    #[error("checksum mismatch")]
    Checksum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub format_version: u32,
    pub embedder_id: String,
    pub dim: usize,
    pub entry_count: usize,
    pub corpus_fingerprint: u64,
    pub created_at: DateTime<Utc>,
    /// Hex SHA-256 over the little-endian vector bytes
    pub checksum: String,
    pub vectors: Vec<Vec<f32>>,
}

impl IndexArtifact {
    pub fn from_index(index: &EmbeddingIndex, embedder_id: &str, corpus_fingerprint: u64) -> Self {
        let vectors: Vec<Vec<f32>> = index.vectors().iter().map(|v| v.as_slice().to_vec()).collect();
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            embedder_id: embedder_id.to_string(),
            dim: index.dim(),
            entry_count: vectors.len(),
            corpus_fingerprint,
            created_at: Utc::now(),
            checksum: vector_checksum(&vectors),
            vectors,
        }
    }

    /// First reason this artifact cannot stand in for a fresh build, if any
    pub fn check(&self, expected: &ArtifactExpectation) -> std::result::Result<(), Incompatibility> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Incompatibility::FormatVersion {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        if self.embedder_id != expected.embedder_id {
            return Err(Incompatibility::Embedder {
                found: self.embedder_id.clone(),
                expected: expected.embedder_id.clone(),
            });
        }
        if self.dim != expected.dim {
            return Err(Incompatibility::Dimension {
                found: self.dim,
                expected: expected.dim,
            });
        }
        if self.entry_count != expected.entry_count || self.vectors.len() != expected.entry_count {
            return Err(Incompatibility::EntryCount {
                found: self.vectors.len(),
                expected: expected.entry_count,
            });
        }
        if self.corpus_fingerprint != expected.corpus_fingerprint {
            return Err(Incompatibility::CorpusChanged);
        }
        if vector_checksum(&self.vectors) != self.checksum {
            return Err(Incompatibility::Checksum);
        }
        Ok(())
    }

    pub fn into_index(self) -> blueprint_core::Result<EmbeddingIndex> {
        let vectors = self.vectors.into_iter().map(Vector::new).collect();
        EmbeddingIndex::from_vectors(self.dim, vectors)
    }
}

fn vector_checksum(vectors: &[Vec<f32>]) -> String {
    let bytes: Vec<u8> = vectors
        .iter()
        .flat_map(|v| v.iter().flat_map(|x| x.to_le_bytes()))
        .collect();
    sha256_hex(&bytes)
}

/// Artifact description for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactDescription {
    pub path: String,
    pub created_at: String,
    pub entry_count: usize,
    pub dim: usize,
    pub size: u64,
}

/// Reads and writes the artifact at a fixed path
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the artifact atomically
    pub fn save(&self, artifact: &IndexArtifact) -> Result<ArtifactDescription> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating artifact directory {}", parent.display()))?;
        }

        let data = bincode::serialize(artifact).map_err(|e| anyhow!("Serialization error: {}", e))?;
        AtomicFile::new(&self.path, AllowOverwrite)
            .write(|f| f.write_all(&data))
            .map_err(|e| anyhow!("Writing artifact {}: {}", self.path.display(), e))?;

        let size = fs::metadata(&self.path)?.len();
        Ok(ArtifactDescription {
            path: self.path.display().to_string(),
            created_at: artifact.created_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            entry_count: artifact.entry_count,
            dim: artifact.dim,
            size,
        })
    }

    /// `Ok(None)` when no artifact exists yet
    pub fn load(&self) -> Result<Option<IndexArtifact>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)
            .with_context(|| format!("reading artifact {}", self.path.display()))?;
        let artifact: IndexArtifact =
            bincode::deserialize(&data).map_err(|e| anyhow!("Deserialization error: {}", e))?;
        Ok(Some(artifact))
    }
}
