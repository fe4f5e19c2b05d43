//! # doclens CLI
//!
//! Every command reads one file (two for `compare`), ingests it into an
//! in-memory store, and prints the result.
//!
//! ## Usage
//!
//! ```bash
//! doclens [--config doclens.toml] [--json] <command> <file> [args]
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `doclens chunk <file>` | Show the chunk windows |
//! | `doclens stats <file>` | Local statistics, no model needed |
//! | `doclens summarize <file>` | Short summary |
//! | `doclens insights <file>` | Statistics plus sentiment, topics, and recommendations |
//! | `doclens keywords <file>` | Keywords, entities, topics, concepts |
//! | `doclens questions <file>` | Study questions |
//! | `doclens ask <file> "<question>"` | Answer from the most relevant chunks |
//! | `doclens similar <file> "<concept>"` | Chunks mentioning a concept |
//! | `doclens compare <a> <b>` | Insights for both plus shared topics |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use doclens::analyzer::DocumentAnalyzer;
use doclens::config::{self, Config};
use doclens::provider::create_provider;
use doclens::report;
use doclens::store::InMemoryStore;

const DEFAULT_CONFIG_PATH: &str = "./doclens.toml";

/// doclens: document statistics, summaries, and Q&A from the command line.
#[derive(Parser)]
#[command(
    name = "doclens",
    about = "doclens: analyze text, Markdown, and PDF documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./doclens.toml` if it exists, otherwise built-in
    /// defaults with the language model disabled.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a document into overlapping chunks.
    Chunk {
        file: PathBuf,

        /// Window size in characters (overrides config).
        #[arg(long)]
        window: Option<usize>,

        /// Overlap in characters (overrides config).
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Word counts, reading time, and readability.
    Stats { file: PathBuf },

    /// Summarize a document.
    Summarize { file: PathBuf },

    /// Local statistics plus model-derived insights.
    Insights { file: PathBuf },

    /// Extract keywords, entities, topics, and concepts.
    Keywords { file: PathBuf },

    /// Generate study questions.
    Questions { file: PathBuf },

    /// Answer a question about a document.
    Ask { file: PathBuf, question: String },

    /// Find chunks related to a concept.
    Similar { file: PathBuf, concept: String },

    /// Compare two documents.
    Compare { first: PathBuf, second: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = load(cli.config.as_deref())?;

    if let Commands::Chunk {
        window, overlap, ..
    } = &cli.command
    {
        if let Some(w) = window {
            cfg.chunking.window_size = *w;
        }
        if let Some(o) = overlap {
            cfg.chunking.overlap = *o;
        }
        config::validate(&cfg)?;
    }

    let provider = create_provider(&cfg.provider)?;
    let analyzer = DocumentAnalyzer::new(cfg, Arc::new(InMemoryStore::new()), provider);
    let json = cli.json;

    match cli.command {
        Commands::Chunk { file, .. } => {
            let doc = analyzer.ingest_path(&file).await?;
            let chunks = analyzer.chunks(&doc.id).await?;
            if json {
                print_json(&chunks)?;
            } else {
                report::print_document_header(&doc);
                report::print_chunks(&chunks);
            }
        }
        Commands::Stats { file } => {
            let doc = analyzer.ingest_path(&file).await?;
            let stats = analyzer.stats(&doc.id).await?;
            if json {
                print_json(&stats)?;
            } else {
                report::print_document_header(&doc);
                report::print_stats(&stats);
            }
        }
        Commands::Summarize { file } => {
            let doc = analyzer.ingest_path(&file).await?;
            let summary = analyzer.summarize(&doc.id).await?;
            if json {
                print_json(&summary)?;
            } else {
                report::print_summary(&summary);
            }
        }
        Commands::Insights { file } => {
            let doc = analyzer.ingest_path(&file).await?;
            let insights = analyzer.insights(&doc.id).await?;
            if json {
                print_json(&insights)?;
            } else {
                report::print_document_header(&doc);
                report::print_insights(&insights);
            }
        }
        Commands::Keywords { file } => {
            let doc = analyzer.ingest_path(&file).await?;
            let keywords = analyzer.keywords(&doc.id).await?;
            if json {
                print_json(&keywords)?;
            } else {
                report::print_keywords(&keywords);
            }
        }
        Commands::Questions { file } => {
            let doc = analyzer.ingest_path(&file).await?;
            let questions = analyzer.questions(&doc.id).await?;
            if json {
                print_json(&questions)?;
            } else {
                report::print_questions(&questions);
            }
        }
        Commands::Ask { file, question } => {
            let doc = analyzer.ingest_path(&file).await?;
            let answer = analyzer.answer(&doc.id, &question).await?;
            if json {
                print_json(&answer)?;
            } else {
                report::print_answer(&answer);
            }
        }
        Commands::Similar { file, concept } => {
            let doc = analyzer.ingest_path(&file).await?;
            let ranked = analyzer.similar_concepts(&doc.id, &concept).await?;
            if json {
                print_json(&ranked)?;
            } else {
                report::print_ranked(&ranked);
            }
        }
        Commands::Compare { first, second } => {
            let a = analyzer.ingest_path(&first).await?;
            let b = analyzer.ingest_path(&second).await?;
            let comparison = analyzer.compare(&a.id, &b.id).await?;
            if json {
                print_json(&comparison)?;
            } else {
                report::print_comparison(
                    &comparison,
                    &a.metadata.filename,
                    &b.metadata.filename,
                );
            }
        }
    }

    Ok(())
}

/// An explicit `--config` must exist; the default path is optional.
fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => config::load_config(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                config::load_config(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
