// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use housing_monitor::utils::logging::{format_error, format_info, format_step, format_success};
use housing_monitor::{
    Config, ContextRetriever, DeduplicationEngine, DocumentSource, Embedder, FixtureSource,
    MemoryIndex, MockEmbedder, MockOracle, OpenAiClient, Oracle, PendingSource,
    PersistenceGateway, PipelineOrchestrator, QdrantIndex, RelevanceClassifier, RunRunner,
    SchemaManager, Store, Summarizer, VectorIndex,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "housing_monitor")]
#[command(version = "0.1.0")]
#[command(about = "Batch pipeline for county housing-legislation documents", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process newly-collected documents through the pipeline
    Run {
        /// Use fixture documents and in-process doubles instead of live
        /// services; no credentials needed
        #[arg(long)]
        mock: bool,

        #[arg(long, value_name = "NUM")]
        limit: Option<usize>,
    },

    /// Create the SQLite schema and both vector collections
    Init,

    /// Show store counts and the latest run audit
    Stats,

    /// Rebuild embeddings for relevant, newly-introduced items
    Reconcile,
}

struct Services {
    oracle: Arc<dyn Oracle>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

fn live_services(config: &Config) -> Result<Services> {
    let client = Arc::new(OpenAiClient::new(&config.oracle)?);
    let index = Arc::new(QdrantIndex::new(&config.vector)?);

    Ok(Services {
        oracle: client.clone(),
        embedder: client,
        index,
    })
}

fn mock_services(config: &Config) -> Services {
    Services {
        oracle: Arc::new(MockOracle::new()),
        embedder: Arc::new(MockEmbedder::new(config.vector.vector_size as usize)),
        index: Arc::new(MemoryIndex::new()),
    }
}

fn build_orchestrator(
    config: &Config,
    store: &Store,
    services: &Services,
) -> PipelineOrchestrator {
    let retriever = ContextRetriever::new(
        services.embedder.clone(),
        services.index.clone(),
        config.vector.kb_collection.clone(),
        config.pipeline.retrieve_top_k,
    );

    PipelineOrchestrator::new(
        RelevanceClassifier::new(
            services.oracle.clone(),
            retriever,
            config.pipeline.classify_text_limit,
        ),
        DeduplicationEngine::new(
            store.clone(),
            services.embedder.clone(),
            services.index.clone(),
            config.vector.items_collection.clone(),
            config.pipeline.dedupe_similarity_threshold,
            config.pipeline.semantic_min_chars,
            config.pipeline.semantic_text_limit,
        ),
        Summarizer::new(services.oracle.clone(), config.pipeline.summary_text_limit),
        PersistenceGateway::new(
            store.clone(),
            services.embedder.clone(),
            services.index.clone(),
            config.vector.items_collection.clone(),
            config.pipeline.embed_text_limit,
        ),
        config.pipeline.relevance_threshold,
    )
}

async fn run_pipeline(config: &Config, mock: bool, limit: Option<usize>) -> Result<()> {
    let store = Store::connect(&config.database.url).await?;
    SchemaManager::new(&store).initialize().await?;

    let services = if mock {
        info!("Running in mock mode");
        mock_services(config)
    } else {
        live_services(config)?
    };

    services
        .index
        .ensure_collection(&config.vector.kb_collection, config.vector.vector_size)
        .await?;
    services
        .index
        .ensure_collection(&config.vector.items_collection, config.vector.vector_size)
        .await?;

    let source: Arc<dyn DocumentSource> = if mock {
        Arc::new(FixtureSource::new(store.clone()))
    } else {
        Arc::new(PendingSource::new(store.clone(), limit))
    };

    let orchestrator = build_orchestrator(config, &store, &services);
    let runner = RunRunner::new(source, store, orchestrator, true);
    let stats = runner.run().await?;

    if stats.failed == 0 {
        println!(
            "{}",
            format_success(&format!(
                "Run complete: {} processed, {} relevant, {} new",
                stats.processed, stats.relevant, stats.new_items
            ))
        );
    } else {
        println!(
            "{}",
            format_error(&format!(
                "Run completed with failures: {} processed, {} failed",
                stats.processed, stats.failed
            ))
        );
    }

    Ok(())
}

async fn init(config: &Config) -> Result<()> {
    println!("{}", format_step(1, 3, "Creating SQLite schema"));
    let store = Store::connect(&config.database.url).await?;
    SchemaManager::new(&store).initialize().await?;

    let index = QdrantIndex::new(&config.vector)?;

    println!(
        "{}",
        format_step(
            2,
            3,
            &format!("Ensuring collection '{}'", config.vector.kb_collection)
        )
    );
    index
        .ensure_collection(&config.vector.kb_collection, config.vector.vector_size)
        .await?;

    println!(
        "{}",
        format_step(
            3,
            3,
            &format!("Ensuring collection '{}'", config.vector.items_collection)
        )
    );
    index
        .ensure_collection(&config.vector.items_collection, config.vector.vector_size)
        .await?;

    println!("{}", format_success("Initialization complete"));
    Ok(())
}

async fn stats(config: &Config) -> Result<()> {
    let store = Store::connect(&config.database.url).await?;

    if !SchemaManager::new(&store).verify().await? {
        println!("{}", format_error("Schema missing; run `init` first"));
        return Ok(());
    }

    let counts = store.counts().await?;
    println!("{}", format_info("Store contents:"));
    println!("  Raw documents: {}", counts.raw_documents);
    println!("  Items: {}", counts.items);
    println!("  Runs: {}", counts.runs);

    match store.latest_run().await? {
        Some(audit) => {
            println!("{}", format_info("Latest run:"));
            println!("  Status: {}", audit.status);
            println!(
                "  Processed: {} | Relevant: {} | New: {}",
                audit.items_processed, audit.items_relevant, audit.items_new
            );
            if audit.has_errors() {
                println!("  Errors:\n{}", audit.error_log);
            }
        }
        None => println!("{}", format_info("No runs recorded yet")),
    }

    for item in store.recent_items(10).await? {
        let marker = if item.is_relevant { "*" } else { " " };
        println!("  {} [{}] {}", marker, item.id, item.title);
    }

    Ok(())
}

async fn reconcile(config: &Config) -> Result<()> {
    let store = Store::connect(&config.database.url).await?;
    let services = live_services(config)?;

    services
        .index
        .ensure_collection(&config.vector.items_collection, config.vector.vector_size)
        .await?;

    let gateway = PersistenceGateway::new(
        store.clone(),
        services.embedder,
        services.index,
        config.vector.items_collection.clone(),
        config.pipeline.embed_text_limit,
    );

    let candidates = store.reconcile_candidates().await?;
    info!("Reconciling embeddings for {} items", candidates.len());

    let mut reindexed = 0usize;
    let mut failed = 0usize;
    for candidate in &candidates {
        match gateway
            .upsert_item_embedding(
                candidate.item_id,
                &candidate.title,
                &candidate.county,
                &candidate.url,
                &candidate.content_text,
            )
            .await
        {
            Ok(()) => reindexed += 1,
            Err(e) => {
                warn!("Failed to reindex item {}: {}", candidate.item_id, e);
                failed += 1;
            }
        }
    }

    if failed == 0 {
        println!(
            "{}",
            format_success(&format!("Reconciled {reindexed} embeddings"))
        );
    } else {
        println!(
            "{}",
            format_error(&format!("Reconciled {reindexed}, failed {failed}"))
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    housing_monitor::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Housing legislation monitor");

    let mut config = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::default_config()
    };

    if config.oracle.api_key.is_none() {
        config.oracle.api_key = std::env::var("OPENAI_API_KEY").ok();
    }

    match cli.command {
        Commands::Run { mock, limit } => run_pipeline(&config, mock, limit).await,
        Commands::Init => init(&config).await,
        Commands::Stats => stats(&config).await,
        Commands::Reconcile => reconcile(&config).await,
    }
}
