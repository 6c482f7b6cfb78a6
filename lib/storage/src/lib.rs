pub mod artifact;
pub mod engine;

pub use artifact::{
    ArtifactDescription, ArtifactExpectation, ArtifactStore, IndexArtifact, Incompatibility,
    ARTIFACT_FORMAT_VERSION,
};
pub use engine::{
    EngineConfig, EngineInfo, IndexSource, IndexState, RetrievalEngine, DEFAULT_CACHE_CAPACITY,
    DEFAULT_CORPUS_PATH,
};
