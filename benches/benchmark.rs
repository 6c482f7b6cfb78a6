// Retrieval benchmarks over synthetic corpora
use blueprint_core::{Corpus, Embedder, EmbeddingIndex, HashingEmbedder, LexicalIndex, PageRole, TemplateEntry};
use blueprint_ranking::{mmr, ComposeRequest, Composer, ComposerConfig, FlatRetriever, HybridScorer, IndexView, MmrConfig, QueryContext, ScoreWeights};
use blueprint_storage::{EngineConfig, RetrievalEngine};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde_json::json;
use std::sync::Arc;

const INDUSTRIES: [&str; 6] = ["restaurant", "tech", "saas", "realestate", "fitness", "ecommerce"];
const WORDS: [&str; 12] = [
    "modern", "cozy", "bold", "minimal", "pricing", "gallery", "menu", "team", "contact", "faq",
    "stats", "booking",
];

fn generate_random_entry(rng: &mut StdRng, id: usize) -> TemplateEntry {
    let role = PageRole::DEFAULT_ORDER[rng.random_range(0..PageRole::DEFAULT_ORDER.len())];
    let industry = INDUSTRIES[rng.random_range(0..INDUSTRIES.len())];
    let description: Vec<&str> = (0..6).map(|_| WORDS[rng.random_range(0..WORDS.len())]).collect();

    let mut entry = TemplateEntry::new(format!("Block{}", id % 40), role)
        .with_id(format!("block-{id}"))
        .with_industries([industry])
        .with_description(description.join(" "))
        .with_schema_key("title", json!("string"))
        .with_image_keywords([WORDS[rng.random_range(0..WORDS.len())]]);
    if rng.random_bool(0.3) {
        entry = entry.with_tags(["general"]);
    }
    if rng.random_bool(0.5) {
        entry = entry.with_schema_key("image", json!("url"));
    }
    entry
}

fn generate_corpus(size: usize) -> Corpus {
    let mut rng = StdRng::seed_from_u64(42);
    Corpus::from_entries((0..size).map(|i| generate_random_entry(&mut rng, i)).collect())
}

struct Fixture {
    corpus: Corpus,
    embeddings: EmbeddingIndex,
    lexical: LexicalIndex,
    embedder: HashingEmbedder,
}

impl Fixture {
    fn new(size: usize) -> Self {
        let corpus = generate_corpus(size);
        let embedder = HashingEmbedder::default();
        let embeddings = EmbeddingIndex::build(&corpus, &embedder).unwrap();
        let lexical = LexicalIndex::build(&corpus);
        Self {
            corpus,
            embeddings,
            lexical,
            embedder,
        }
    }

    fn view(&self) -> IndexView<'_> {
        IndexView::new(&self.corpus, &self.embeddings, &self.lexical)
    }
}

fn benchmark_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for size in [100, 1000].iter() {
        let corpus = generate_corpus(*size);
        let embedder = HashingEmbedder::default();
        group.bench_with_input(BenchmarkId::new("embed_and_lexical", size), size, |b, _| {
            b.iter(|| {
                let embeddings = EmbeddingIndex::build(black_box(&corpus), &embedder).unwrap();
                let lexical = LexicalIndex::build(&corpus);
                black_box((embeddings, lexical));
            });
        });
    }

    group.finish();
}

fn benchmark_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");

    for size in [100, 1000, 5000].iter() {
        let fixture = Fixture::new(*size);
        let composer = Composer::new(fixture.view(), ComposerConfig::default());
        let request = ComposeRequest::new(["cozy restaurant menu", "booking"]).with_industry("restaurant");
        let query = fixture.embedder.embed(&request.query_text()).unwrap();

        group.bench_with_input(BenchmarkId::new("full_page", size), size, |b, _| {
            b.iter(|| black_box(composer.compose(black_box(&request), &query)));
        });
    }

    group.finish();
}

fn benchmark_mmr(c: &mut Criterion) {
    let mut group = c.benchmark_group("mmr");
    let fixture = Fixture::new(2000);
    let scorer = HybridScorer::new(fixture.view(), ScoreWeights::default());
    let text = "modern saas pricing";
    let query = QueryContext::new(text, fixture.embedder.embed(text).unwrap(), "saas", true);

    for pool_size in [50, 200, 1000].iter() {
        let pool = scorer.score_pool(0..*pool_size, &query, None);
        group.bench_with_input(BenchmarkId::new("select_8", pool_size), pool_size, |b, _| {
            b.iter(|| black_box(mmr::select(pool.clone(), MmrConfig::new(0.7, 8))));
        });
    }

    group.finish();
}

fn benchmark_flat(c: &mut Criterion) {
    let fixture = Fixture::new(2000);
    let retriever = FlatRetriever::new(fixture.view(), ScoreWeights::default(), 18);
    let text = "bold fitness booking gallery";
    let query = fixture.embedder.embed(text).unwrap();

    c.bench_function("flat_k16", |b| {
        b.iter(|| black_box(retriever.retrieve(black_box(text), &query, "fitness", true, 16)));
    });
}

fn benchmark_cached_engine(c: &mut Criterion) {
    let engine = RetrievalEngine::from_corpus(
        generate_corpus(1000),
        EngineConfig::default(),
        Arc::new(HashingEmbedder::default()),
    )
    .unwrap();
    let request = ComposeRequest::new(["minimal tech landing"]).with_industry("tech");
    engine.retrieve_by_roles(&request).unwrap();

    c.bench_function("engine_cache_hit", |b| {
        b.iter(|| black_box(engine.retrieve_by_roles(black_box(&request)).unwrap()));
    });
}

fn benchmark_concurrent_reads(c: &mut Criterion) {
    let engine = Arc::new(
        RetrievalEngine::from_corpus(
            generate_corpus(1000),
            EngineConfig::default().with_cache_capacity(0),
            Arc::new(HashingEmbedder::default()),
        )
        .unwrap(),
    );
    engine.ensure_ready().unwrap();

    c.bench_function("concurrent_compose_4_threads", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let engine = Arc::clone(&engine);
                    std::thread::spawn(move || {
                        let request = ComposeRequest::new([WORDS[i], WORDS[i + 4]]).with_industry(INDUSTRIES[i]);
                        engine.retrieve_by_roles(&request).map(|s| s.len())
                    })
                })
                .collect();
            for handle in handles {
                black_box(handle.join().unwrap().unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_compose,
    benchmark_mmr,
    benchmark_flat,
    benchmark_cached_engine,
    benchmark_concurrent_reads
);
criterion_main!(benches);
