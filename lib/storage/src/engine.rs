use crate::artifact::{ArtifactExpectation, ArtifactStore, IndexArtifact};
use blueprint_core::{
    checked_embedding, Corpus, Embedder, EmbeddingIndex, Error, LexicalIndex, LoadReport, Result,
    TemplateEntry,
};
use blueprint_ranking::{
    ComposeRequest, Composer, ComposerConfig, FlatRetriever, IndexView, RetrievalTrace, ScoreWeights,
    Slate, DEFAULT_FLAT_RESULT_CAP, DEFAULT_IMAGE_KEYWORD_CAP, DEFAULT_LAMBDA,
};
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_CORPUS_PATH: &str = "./data/components.jsonl";
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Engine settings. Defaults match a single-process deployment reading
/// `./data/components.jsonl` with an in-memory index.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub corpus_path: PathBuf,
    /// Where the embedding artifact is loaded from and saved to; `None`
    /// keeps the index in memory only
    pub index_path: Option<PathBuf>,
    /// Memoized slates; 0 disables the cache
    pub cache_capacity: usize,
    pub mmr_lambda: f64,
    pub flat_result_cap: usize,
    pub image_keyword_cap: usize,
    pub weights: ScoreWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            index_path: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            mmr_lambda: DEFAULT_LAMBDA,
            flat_result_cap: DEFAULT_FLAT_RESULT_CAP,
            image_keyword_cap: DEFAULT_IMAGE_KEYWORD_CAP,
            weights: ScoreWeights::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_corpus_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.corpus_path = path.into();
        self
    }

    #[must_use]
    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_mmr_lambda(mut self, lambda: f64) -> Self {
        self.mmr_lambda = lambda;
        self
    }

    #[must_use]
    pub fn with_flat_result_cap(mut self, cap: usize) -> Self {
        self.flat_result_cap = cap;
        self
    }

    #[must_use]
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mmr_lambda.is_finite() {
            return Err(Error::InvalidConfig("mmr_lambda must be finite".to_string()));
        }
        if self.image_keyword_cap == 0 {
            return Err(Error::InvalidConfig("image_keyword_cap must be at least 1".to_string()));
        }
        if self.flat_result_cap == 0 {
            return Err(Error::InvalidConfig("flat_result_cap must be at least 1".to_string()));
        }
        self.weights.validate().map_err(Error::InvalidConfig)
    }

    fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            weights: self.weights,
            mmr_lambda: self.mmr_lambda.clamp(0.0, 1.0),
            image_keyword_cap: self.image_keyword_cap,
        }
    }
}

/// Where the current embedding index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSource {
    Artifact,
    Built,
}

/// Corpus plus the two indexes built over it. Read-only once published.
#[derive(Debug)]
pub struct IndexState {
    pub corpus: Arc<Corpus>,
    pub report: Arc<LoadReport>,
    pub embeddings: EmbeddingIndex,
    pub lexical: LexicalIndex,
    pub source: IndexSource,
    pub ready_at: DateTime<Utc>,
    /// Increments on every publish; part of every memo key
    pub generation: usize,
}

impl IndexState {
    pub fn view(&self) -> IndexView<'_> {
        IndexView::new(&self.corpus, &self.embeddings, &self.lexical)
    }
}

/// Diagnostics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub corpus_path: Option<String>,
    pub index_path: Option<String>,
    pub embedder: String,
    pub entries: usize,
    pub skipped: usize,
    pub dim: usize,
    pub corpus_fingerprint: String,
    pub ready: bool,
    pub index_source: Option<IndexSource>,
    pub ready_at: Option<String>,
    pub builds: usize,
    pub cached_slates: usize,
}

type SlateCache = Mutex<LruCache<(usize, u64), Arc<Slate>>>;

/// The shared retrieval entry point.
///
/// Owns the corpus, builds the indexes at most once behind a double-checked
/// lock, and memoizes composed slates. `Send + Sync`; share it behind `Arc`.
pub struct RetrievalEngine {
    config: EngineConfig,
    embedder: Arc<dyn Embedder>,
    corpus_file: Option<PathBuf>,
    corpus: RwLock<(Arc<Corpus>, Arc<LoadReport>)>,
    artifacts: Option<ArtifactStore>,
    state: RwLock<Option<Arc<IndexState>>>,
    build_lock: Mutex<()>,
    builds: AtomicUsize,
    cache: Option<SlateCache>,
}

impl RetrievalEngine {
    /// Load the corpus from `config.corpus_path`. A missing or unreadable
    /// corpus fails here; the indexes are built lazily on first use.
    pub fn open(config: EngineConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        let (corpus, report) = Corpus::load(&config.corpus_path)?;
        let corpus_file = Some(config.corpus_path.clone());
        Ok(Self::assemble(config, embedder, corpus, report, corpus_file))
    }

    /// Serve an in-memory corpus. `config.corpus_path` is ignored and
    /// [`RetrievalEngine::rebuild`] reuses the same entries.
    pub fn from_corpus(corpus: Corpus, config: EngineConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        let report = LoadReport {
            loaded: corpus.len(),
            skipped: Vec::new(),
        };
        Ok(Self::assemble(config, embedder, corpus, report, None))
    }

    fn assemble(
        config: EngineConfig,
        embedder: Arc<dyn Embedder>,
        corpus: Corpus,
        report: LoadReport,
        corpus_file: Option<PathBuf>,
    ) -> Self {
        let artifacts = config.index_path.as_ref().map(ArtifactStore::new);
        let cache = NonZeroUsize::new(config.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            config,
            embedder,
            corpus_file,
            corpus: RwLock::new((Arc::new(corpus), Arc::new(report))),
            artifacts,
            state: RwLock::new(None),
            build_lock: Mutex::new(()),
            builds: AtomicUsize::new(0),
            cache,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn corpus(&self) -> Arc<Corpus> {
        Arc::clone(&self.corpus.read().0)
    }

    pub fn load_report(&self) -> Arc<LoadReport> {
        Arc::clone(&self.corpus.read().1)
    }

    /// Index publications so far (artifact loads and fresh builds)
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.state.read().is_some()
    }

    /// Current indexes without building; `IndexNotReady` before the first build
    pub fn try_indexes(&self) -> Result<Arc<IndexState>> {
        self.state.read().clone().ok_or(Error::IndexNotReady)
    }

    /// Current indexes, building them first if needed. Concurrent first
    /// callers block on one build and all observe its result.
    pub fn ensure_ready(&self) -> Result<Arc<IndexState>> {
        if let Some(state) = self.state.read().as_ref() {
            return Ok(Arc::clone(state));
        }

        let _guard = self.build_lock.lock();
        if let Some(state) = self.state.read().as_ref() {
            return Ok(Arc::clone(state));
        }

        let (corpus, report) = self.corpus.read().clone();
        let state = Arc::new(self.build_state(corpus, report, false)?);
        *self.state.write() = Some(Arc::clone(&state));
        Ok(state)
    }

    /// Re-read the corpus (when file-backed), re-embed every entry, overwrite
    /// the artifact and drop memoized slates
    pub fn rebuild(&self) -> Result<Arc<IndexState>> {
        let _guard = self.build_lock.lock();

        if let Some(path) = &self.corpus_file {
            let (corpus, report) = Corpus::load(path)?;
            *self.corpus.write() = (Arc::new(corpus), Arc::new(report));
        }
        let (corpus, report) = self.corpus.read().clone();
        let state = Arc::new(self.build_state(corpus, report, true)?);
        *self.state.write() = Some(Arc::clone(&state));

        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
        Ok(state)
    }

    fn build_state(&self, corpus: Arc<Corpus>, report: Arc<LoadReport>, force: bool) -> Result<IndexState> {
        let lexical = LexicalIndex::build(&corpus);
        let expectation = ArtifactExpectation {
            embedder_id: self.embedder.id(),
            dim: self.embedder.dim(),
            entry_count: corpus.len(),
            corpus_fingerprint: corpus.fingerprint(),
        };

        let reused = match (&self.artifacts, force) {
            (Some(store), false) => self.load_artifact(store, &expectation),
            _ => None,
        };

        let (embeddings, source) = match reused {
            Some(index) => (index, IndexSource::Artifact),
            None => {
                let index = EmbeddingIndex::build(&corpus, self.embedder.as_ref())?;
                info!(entries = index.len(), dim = index.dim(), "Embedding index built");
                if let Some(store) = &self.artifacts {
                    let artifact = IndexArtifact::from_index(&index, &expectation.embedder_id, expectation.corpus_fingerprint);
                    match store.save(&artifact) {
                        Ok(desc) => info!(path = %desc.path, size = desc.size, "Index artifact saved"),
                        Err(e) => warn!(path = %store.path().display(), error = %e, "Failed to save index artifact"),
                    }
                }
                (index, IndexSource::Built)
            }
        };

        let generation = self.builds.fetch_add(1, Ordering::AcqRel) + 1;
        Ok(IndexState {
            corpus,
            report,
            embeddings,
            lexical,
            source,
            ready_at: Utc::now(),
            generation,
        })
    }

    fn load_artifact(&self, store: &ArtifactStore, expectation: &ArtifactExpectation) -> Option<EmbeddingIndex> {
        let artifact = match store.load() {
            Ok(Some(artifact)) => artifact,
            Ok(None) => {
                info!(path = %store.path().display(), "No index artifact, building");
                return None;
            }
            Err(e) => {
                warn!(path = %store.path().display(), error = %e, "Unreadable index artifact, rebuilding");
                return None;
            }
        };

        if let Err(reason) = artifact.check(expectation) {
            info!(path = %store.path().display(), %reason, "Index artifact is stale, rebuilding");
            return None;
        }

        match artifact.into_index() {
            Ok(index) => {
                info!(path = %store.path().display(), entries = index.len(), "Index loaded from artifact");
                Some(index)
            }
            Err(e) => {
                warn!(error = %e, "Index artifact rejected, rebuilding");
                None
            }
        }
    }

    fn embed_query(&self, text: &str) -> Option<blueprint_core::Vector> {
        match checked_embedding(self.embedder.as_ref(), text) {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(error = %e, "Query embedding failed, returning no results");
                None
            }
        }
    }

    /// One ranked, role-agnostic pool of at most `flat_result_cap` copies
    pub fn retrieve_flat(&self, query: &str, industry: &str, need_images: bool, k: usize) -> Result<Vec<TemplateEntry>> {
        let state = self.ensure_ready()?;
        let query = query.trim();
        if query.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let Some(vector) = self.embed_query(query) else {
            return Ok(Vec::new());
        };

        let retriever = FlatRetriever::new(state.view(), self.config.weights, self.config.flat_result_cap);
        Ok(retriever.retrieve(query, &vector, industry, need_images, k))
    }

    /// Role-balanced slate. Repeated requests against the same index are
    /// served from the memo cache.
    pub fn retrieve_by_roles(&self, request: &ComposeRequest) -> Result<Arc<Slate>> {
        let state = self.ensure_ready()?;
        let key = (state.generation, request.cache_key());

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lock().get(&key) {
                debug!(key = key.1, "Slate cache hit");
                return Ok(Arc::clone(hit));
            }
        }

        let text = request.query_text();
        let slate = if text.is_empty() {
            Slate::empty(&request.resolved_roles())
        } else {
            match self.embed_query(&text) {
                Some(vector) => Composer::new(state.view(), self.config.composer_config()).compose(request, &vector),
                None => return Ok(Arc::new(Slate::empty(&request.resolved_roles()))),
            }
        };

        let slate = Arc::new(slate);
        self.remember(&state, key, &slate);
        Ok(slate)
    }

    /// Memoize `slate` unless a rebuild has published a newer index since
    /// `state` was taken. Checked under the cache lock, which `rebuild`
    /// takes only after publishing.
    fn remember(&self, state: &IndexState, key: (usize, u64), slate: &Arc<Slate>) {
        let Some(cache) = &self.cache else {
            return;
        };
        let mut cache = cache.lock();
        let current = self.state.read().as_ref().map(|s| s.generation);
        if current == Some(state.generation) {
            cache.put(key, Arc::clone(slate));
        } else {
            debug!(generation = state.generation, "Index replaced, slate not cached");
        }
    }

    /// Score breakdown of every candidate the slate for `request` considered
    pub fn explain(&self, request: &ComposeRequest) -> Result<RetrievalTrace> {
        let state = self.ensure_ready()?;
        let text = request.query_text();
        let vector = if text.is_empty() {
            blueprint_core::Vector::zeros(self.embedder.dim())
        } else {
            checked_embedding(self.embedder.as_ref(), &text)?
        };
        Ok(Composer::new(state.view(), self.config.composer_config()).explain(request, &vector))
    }

    pub fn cached_slates(&self) -> usize {
        self.cache.as_ref().map(|c| c.lock().len()).unwrap_or(0)
    }

    pub fn info(&self) -> EngineInfo {
        let (corpus, report) = self.corpus.read().clone();
        let state = self.state.read().clone();
        EngineInfo {
            corpus_path: self.corpus_file.as_deref().map(display_path),
            index_path: self.artifacts.as_ref().map(|s| display_path(s.path())),
            embedder: self.embedder.id(),
            entries: corpus.len(),
            skipped: report.skipped_count(),
            dim: self.embedder.dim(),
            corpus_fingerprint: format!("{:016x}", corpus.fingerprint()),
            ready: state.is_some(),
            index_source: state.as_ref().map(|s| s.source),
            ready_at: state
                .as_ref()
                .map(|s| s.ready_at.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            builds: self.build_count(),
            cached_slates: self.cached_slates(),
        }
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
