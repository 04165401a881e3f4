//! # docsync CLI
//!
//! Command-line interface for the sync and retrieval pipeline.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsync init` | Create the configured index with the page mapping |
//! | `docsync indices` | List all indices in the cluster |
//! | `docsync drop-index <name>` | Delete an index (no-op when absent) |
//! | `docsync sync <table> <group-key>` | Bulk-sync one file's pages into the index |
//! | `docsync get <group-key>` | Fetch all indexed pages of one file |
//! | `docsync search "<query>"` | Search (keyword, semantic, or hybrid) |
//!
//! ## Examples
//!
//! ```bash
//! docsync --config ./config/docsync.toml init
//! docsync sync pjt_001 5476ca42f4dd6e62009b59289f1c7f84
//! docsync search "energy policy" --mode hybrid --size 5 --min-score 0.5
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use docsync::config::{load_config, Config};
use docsync::db;
use docsync::elastic::ElasticClient;
use docsync::embedding;
use docsync::index;
use docsync::query::SearchParams;
use docsync::rows::PgRowSource;
use docsync::search;
use docsync::sync;

/// docsync — sync parsed PDF pages from Postgres into Elasticsearch and
/// search them with combined keyword + vector retrieval.
#[derive(Parser)]
#[command(
    name = "docsync",
    about = "Sync parsed PDF pages from Postgres into Elasticsearch and run hybrid retrieval",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docsync.toml")]
    config: PathBuf,

    /// Target index; defaults to `elastic.index` from the config.
    #[arg(long, global = true)]
    index: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the target index with the page mapping. Idempotent.
    Init,

    /// List all index names known to the cluster.
    Indices,

    /// Delete an index. Absence is reported, not an error.
    DropIndex {
        /// Name of the index to delete.
        name: String,
    },

    /// Sync every page sharing a group key from Postgres into the index.
    Sync {
        /// Source table holding the page rows.
        table: String,
        /// Group key (`hashed_filepath`) identifying one source file.
        group_key: String,
    },

    /// Fetch every indexed page of one source file.
    Get {
        /// Group key (`hashed_filepath`) identifying one source file.
        group_key: String,
    },

    /// Search the index.
    Search {
        /// Query text.
        query: String,
        /// Search mode: keyword, semantic, or hybrid.
        #[arg(long, default_value = "hybrid")]
        mode: String,
        /// Maximum number of results.
        #[arg(long)]
        size: Option<usize>,
        /// Minimum relevance score.
        #[arg(long)]
        min_score: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let index_name = cli
        .index
        .clone()
        .unwrap_or_else(|| config.elastic.index.clone());

    let client = ElasticClient::new(&config.elastic)?;

    match cli.command {
        Commands::Init => {
            index::ensure_index(&client, &index_name, config.embedding.dims).await?;
            println!("index '{index_name}' ready");
        }
        Commands::Indices => {
            let mut names = index::list_indices(&client).await?;
            names.sort();
            for name in names {
                println!("{name}");
            }
        }
        Commands::DropIndex { name } => {
            if index::delete_index(&client, &name).await? {
                println!("index '{name}' deleted");
            } else {
                println!("index '{name}' does not exist, nothing to do");
            }
        }
        Commands::Sync { table, group_key } => {
            run_sync(&config, &client, &index_name, &table, &group_key).await?;
        }
        Commands::Get { group_key } => {
            let documents = search::fetch_by_group_key(&client, &index_name, &group_key).await?;
            if documents.is_empty() {
                println!("No documents.");
            } else {
                println!("{} document(s) for group key {group_key}", documents.len());
                for doc in &documents {
                    println!("  [page {}] {} ({})", doc.page, doc.filename, doc.id);
                }
            }
        }
        Commands::Search {
            query,
            mode,
            size,
            min_score,
        } => {
            run_search(&config, &client, &index_name, &query, &mode, size, min_score).await?;
        }
    }

    Ok(())
}

async fn run_sync(
    config: &Config,
    client: &ElasticClient,
    index_name: &str,
    table: &str,
    group_key: &str,
) -> Result<()> {
    let pool = db::connect(&config.postgres).await?;
    let source = PgRowSource::new(pool);

    let report = sync::sync_group(
        client,
        &source,
        index_name,
        table,
        group_key,
        config.embedding.dims,
        config.sync.missing_id,
    )
    .await?;

    println!("sync {group_key} -> {index_name}");
    println!("  attempted: {}", report.attempted);
    println!("  succeeded: {}", report.succeeded);
    println!("  failed: {}", report.failed);
    for failure in &report.failures {
        println!("  failure: {} — {}", failure.id, failure.reason);
    }
    println!("ok");
    Ok(())
}

async fn run_search(
    config: &Config,
    client: &ElasticClient,
    index_name: &str,
    query: &str,
    mode: &str,
    size: Option<usize>,
    min_score: Option<f64>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    match mode {
        "keyword" | "semantic" | "hybrid" => {}
        _ => bail!("Unknown search mode: {mode}. Use keyword, semantic, or hybrid."),
    }

    let size = size.unwrap_or(config.retrieval.default_size);
    let min_score = min_score.unwrap_or(config.retrieval.default_min_score);

    // Semantic and hybrid need a query vector; hybrid can live without one.
    let vector = if mode == "semantic" || mode == "hybrid" {
        match embedding::embed_query(&config.embedding, query).await {
            Ok(vector) => Some(vector),
            Err(err) if mode == "hybrid" => {
                warn!(error = %err, "query embedding failed, falling back to keyword-only");
                None
            }
            Err(err) => return Err(err),
        }
    } else {
        None
    };

    let params = SearchParams {
        text: if mode == "semantic" { None } else { Some(query) },
        vector: vector.as_deref(),
        size,
        min_score,
    };

    let results = search::search(
        client,
        index_name,
        &params,
        &config.retrieval,
        config.embedding.dims,
    )
    .await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let doc = &result.document;
        println!(
            "{}. [{:.3}] {} — page {}",
            i + 1,
            result.score,
            doc.filename,
            doc.page
        );
        let excerpt: String = doc.page_content.chars().take(160).collect();
        println!("    excerpt: \"{}\"", excerpt.replace('\n', " "));
        println!("    id: {}", doc.id);
        println!();
    }

    Ok(())
}
