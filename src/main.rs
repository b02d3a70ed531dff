use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use medrag_core::RagQuery;
use medrag_rag::{AppConfig, DocumentProcessor, QueryEngine, build_embedder};

mod display;

#[derive(Parser)]
#[command(name = "medrag")]
#[command(about = "Question answering over your medical documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI (default)
    Serve,
    /// Build the index from a documents directory
    Ingest {
        /// Documents directory (defaults to MEDRAG_DOCS_DIR)
        dir: Option<PathBuf>,
    },
    /// Ask a single question from the terminal
    Ask {
        question: String,
        /// Number of chunks to retrieve
        #[arg(long)]
        top_k: Option<usize>,
        /// Print the context sent to the backend
        #[arg(long)]
        show_context: bool,
    },
    /// Show index statistics and configured backends
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;
    info!(
        docs_dir = %config.docs_dir.display(),
        index_dir = %config.index_dir.display(),
        embedding = ?config.embedding.provider,
        "Configuration loaded"
    );

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let engine = QueryEngine::open(config)?;
            display::display_banner(&format!("http://{}", engine.config().bind_address()));
            medrag_web::run_server(engine).await?;
        }
        Commands::Ingest { dir } => {
            let docs_dir = dir.unwrap_or_else(|| config.docs_dir.clone());
            println!("{} Ingesting {}", "📚".blue(), docs_dir.display());

            let embedder = build_embedder(&config.embedding)?;
            let processor = DocumentProcessor::new(embedder, config.indexing.clone());
            let (_, report) = processor
                .ingest(&docs_dir, &config.index_dir)
                .await
                .with_context(|| format!("ingestion of {} failed", docs_dir.display()))?;
            display::print_report(&report);
        }
        Commands::Ask {
            question,
            top_k,
            show_context,
        } => {
            let top_k = top_k.unwrap_or(config.top_k);
            let engine = QueryEngine::open(config)?;
            let outcome = engine.ask(&RagQuery { question, top_k }).await?;
            display::print_outcome(&outcome, show_context);
        }
        Commands::Stats => {
            let engine = QueryEngine::open(config)?;
            display::print_stats(&engine.stats().await, &engine.backend_status());
        }
    }

    Ok(())
}
