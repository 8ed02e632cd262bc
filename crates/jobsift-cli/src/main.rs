use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jobsift_scrapers::{HttpClientConfig, HttpFetcher};
use jobsift_storage::SqliteJobStore;
use jobsift_sync::{load_source_registry, HttpFetchBackend, ReconcileEngine};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "jobsift")]
#[command(about = "Job-board scraping and reconciliation pipeline")]
struct Cli {
    /// SQLite database location.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://jobs.db", global = true)]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape all configured sources and reconcile the store.
    Sync {
        /// Source registry file.
        #[arg(long, default_value = "sources.yaml")]
        sources: PathBuf,
    },
    /// Create the database schema.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = SqliteJobStore::connect(&cli.database_url).await?;

    match cli.command {
        Commands::Sync { sources } => {
            let registry = load_source_registry(&sources)?;
            let http = HttpFetcher::new(HttpClientConfig::default())?;
            let engine =
                ReconcileEngine::new(Box::new(store), Box::new(HttpFetchBackend::new(http)));
            let report = engine.run(&registry.sources).await;

            println!(
                "run {} complete: scraped={} inserted={} updated={} reactivated={} deactivated={} failed={}",
                report.run_id,
                report.sources_scraped,
                report.inserted,
                report.updated,
                report.reactivated,
                report.deactivated,
                report.failed_sources.len()
            );
            for failure in &report.failed_sources {
                eprintln!(
                    "  {} ({}) failed during {:?}: {}",
                    failure.company, failure.source, failure.stage, failure.error
                );
            }
        }
        Commands::Migrate => {
            store.init_schema().await?;
            println!("schema ready at {}", cli.database_url);
        }
    }

    Ok(())
}
