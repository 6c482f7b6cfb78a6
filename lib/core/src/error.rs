use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Corpus load failed for {path}: {reason}")]
    CorpusLoad { path: String, reason: String },

    #[error("Index not ready: build has not completed")]
    IndexNotReady,

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

