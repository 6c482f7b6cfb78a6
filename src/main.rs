use anyhow::Context;
use blueprint_core::HashingEmbedder;
use blueprint_ranking::ComposeRequest;
use blueprint_storage::{EngineConfig, RetrievalEngine};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Role-balanced retrieval of UI component blueprints
#[derive(Parser, Debug)]
#[command(name = "blueprint")]
#[command(about = "Retrieve role-balanced component slates from a blueprint corpus", long_about = None)]
struct Args {
    /// Path to the JSONL corpus
    #[arg(short, long, env = "BLUEPRINT_CORPUS", default_value = "./data/components.jsonl")]
    corpus: PathBuf,

    /// Where to load and save the embedding index artifact
    #[arg(long, env = "BLUEPRINT_INDEX")]
    index: Option<PathBuf>,

    /// Memoized slates kept in memory (0 disables)
    #[arg(long, env = "BLUEPRINT_CACHE_CAPACITY", default_value_t = 128)]
    cache_capacity: usize,

    /// Hashing embedder dimension
    #[arg(long, env = "BLUEPRINT_EMBED_DIM", default_value_t = blueprint_core::DEFAULT_HASH_DIM)]
    embed_dim: usize,

    /// MMR relevance/diversity trade-off in [0, 1]
    #[arg(long, default_value_t = 0.7)]
    lambda: f64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show corpus and index diagnostics
    Info,
    /// Build the embedding index, reusing a compatible artifact unless forced
    BuildIndex {
        /// Re-embed everything and overwrite the artifact
        #[arg(long)]
        force: bool,
    },
    /// One ranked pool, no role bucketing
    Search {
        query: String,
        #[arg(long, default_value = "")]
        industry: String,
        /// Do not favour image-bearing templates
        #[arg(long)]
        no_images: bool,
        /// Nearest neighbours fetched before re-ranking
        #[arg(short, default_value_t = 16)]
        k: usize,
    },
    /// Compose a role-balanced slate
    Compose(ComposeArgs),
    /// Show the score breakdown behind a slate
    Explain(ComposeArgs),
}

#[derive(ClapArgs, Debug)]
struct ComposeArgs {
    /// Free-text query terms
    #[arg(required = true)]
    terms: Vec<String>,
    #[arg(long, default_value = "")]
    industry: String,
    #[arg(long, default_value = "")]
    style: String,
    #[arg(long)]
    no_images: bool,
    /// Comma-separated role hints; defaults to the full page order
    #[arg(long, value_delimiter = ',')]
    roles: Vec<String>,
    /// MMR picks per role before the role cap
    #[arg(short, default_value_t = 3)]
    k: usize,
}

impl ComposeArgs {
    fn request(&self) -> ComposeRequest {
        ComposeRequest::new(self.terms.iter().cloned())
            .with_industry(self.industry.clone())
            .with_style(self.style.clone())
            .with_need_images(!self.no_images)
            .with_roles(self.roles.iter().cloned())
            .with_k_per_role(self.k)
    }
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    // RUST_LOG directives take precedence over --log-level
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting Blueprint v{}", env!("CARGO_PKG_VERSION"));
    info!("Corpus: {:?}", args.corpus);

    let mut config = EngineConfig::default()
        .with_corpus_path(&args.corpus)
        .with_cache_capacity(args.cache_capacity)
        .with_mmr_lambda(args.lambda);
    if let Some(index) = &args.index {
        config = config.with_index_path(index);
    }

    let embedder = Arc::new(HashingEmbedder::new(args.embed_dim)?);
    let engine = RetrievalEngine::open(config, embedder)
        .with_context(|| format!("opening corpus {}", args.corpus.display()))?;

    match &args.command {
        Command::Info => print_json(&engine.info())?,
        Command::BuildIndex { force } => {
            let state = if *force { engine.rebuild()? } else { engine.ensure_ready()? };
            info!(
                entries = state.corpus.len(),
                source = ?state.source,
                "Index ready"
            );
            print_json(&engine.info())?;
        }
        Command::Search {
            query,
            industry,
            no_images,
            k,
        } => {
            let results = engine.retrieve_flat(query, industry, !no_images, *k)?;
            print_json(&results)?;
        }
        Command::Compose(compose) => {
            let slate = engine.retrieve_by_roles(&compose.request())?;
            print_json(slate.as_ref())?;
        }
        Command::Explain(compose) => {
            let trace = engine.explain(&compose.request())?;
            print_json(&trace)?;
        }
    }

    Ok(())
}
