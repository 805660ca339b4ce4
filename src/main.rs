//! # docshelf CLI (`shelf`)
//!
//! The `shelf` binary is the primary interface for docshelf. It provides
//! commands for store initialization, library ingestion, single-file
//! ingestion, similarity search, and index statistics.
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf init` | Create the library directories and an empty store |
//! | `shelf ingest` | Discover, chunk, embed, and index the whole library |
//! | `shelf ingest-file <path>` | Reindex a single file |
//! | `shelf search "<query>"` | Rank indexed chunks against a query |
//! | `shelf stats` | Show entry/document counts and dimensionality |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docshelf::config::load_config;
use docshelf::embedding::create_provider;
use docshelf::ingest::{ingest_directory, ingest_file};
use docshelf::models::Category;
use docshelf::search::run_search;
use docshelf::store::VectorStore;

/// docshelf — a content-addressed document ingestion and similarity
/// retrieval pipeline for office-document libraries.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/shelf.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "docshelf — content-addressed document ingestion and similarity retrieval",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the library category directories and an empty store file.
    ///
    /// Idempotent — running it multiple times is safe.
    Init,

    /// Ingest the whole library: discover, chunk, embed, index.
    ///
    /// Each document's chunks replace any previously indexed chunks with
    /// the same content hash. Prints a summary with ignored files and
    /// their reasons.
    Ingest,

    /// Ingest a single file (incremental/upload flow).
    IngestFile {
        /// File to reindex; must live under the configured library root.
        path: PathBuf,
    },

    /// Rank indexed chunks against a query by cosine similarity.
    Search {
        /// Search query text.
        query: String,

        /// Maximum results (defaults to retrieval.top_k from config).
        #[arg(long)]
        limit: Option<usize>,

        /// Minimum similarity score (defaults to retrieval.min_score).
        #[arg(long)]
        min_score: Option<f32>,
    },

    /// Show index statistics.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            for category in [Category::Processos, Category::Sistemas] {
                std::fs::create_dir_all(config.library.root.join(category.as_str()))?;
            }
            let provider = create_provider(&config.embedding)?;
            let store = VectorStore::open(&config.store.path, provider)?;
            if !store.path().exists() {
                if let Some(parent) = store.path().parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                // An empty store persists as an empty entry collection.
                std::fs::write(store.path(), "[]")?;
            }
            println!("initialized {}", config.store.path.display());
        }

        Commands::Ingest => {
            let provider = create_provider(&config.embedding)?;
            let store = VectorStore::open(&config.store.path, provider)?;
            let stats = ingest_directory(&config, &store).await?;

            println!("ingest {}", config.library.root.display());
            println!("  processed documents: {}", stats.processed_docs);
            println!("  indexed chunks: {}", stats.indexed_chunks);
            println!("  ignored: {}", stats.ignored.len());
            for item in &stats.ignored {
                println!("    - {}: {}", item.source_path.display(), item.reason);
            }
            println!("ok");
        }

        Commands::IngestFile { path } => {
            let provider = create_provider(&config.embedding)?;
            let store = VectorStore::open(&config.store.path, provider)?;
            if ingest_file(&config, &store, &path).await? {
                println!("indexed {}", path.display());
            } else {
                println!("saved but not indexed: {}", path.display());
            }
        }

        Commands::Search {
            query,
            limit,
            min_score,
        } => {
            let provider = create_provider(&config.embedding)?;
            let store = VectorStore::open(&config.store.path, provider)?;
            run_search(&config, &store, &query, limit, min_score).await?;
        }

        Commands::Stats => {
            let provider = create_provider(&config.embedding)?;
            let store = VectorStore::open(&config.store.path, provider)?;
            let stats = store.stats();
            println!("store {}", store.path().display());
            println!("  entries: {}", stats.entries);
            println!("  documents: {}", stats.documents);
            match stats.dims {
                Some(dims) => println!("  dimensions: {}", dims),
                None => println!("  dimensions: (empty)"),
            }
        }
    }

    Ok(())
}
