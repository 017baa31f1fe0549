

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use hq_core::Config;
use hq_engine::Engine;

mod commands;
use commands::{fetch, index, quote, search, stats, sync_all};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "hq")]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Verbose output
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Fetch daily bars for a symbol (smart fetch through the local archive)
  Fetch(fetch::FetchCommand),

  /// Live quotes for one or more symbols
  Quote(quote::QuoteCommand),

  /// Market index snapshots (domestic benchmarks or ^HSI/^DJI/...)
  Index(index::IndexCommand),

  /// Refresh every symbol tracked by the local archive
  SyncAll(sync_all::SyncAllCommand),

  /// Search the symbol directory by code or name
  Search(search::SearchCommand),

  /// Archive statistics and queue counters
  Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
  // Load environment variables
  dotenv().ok();

  // Parse CLI arguments
  let cli = Cli::parse();

  // Initialize logging
  let log_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt().with_env_filter(log_level).init();

  // Load configuration and wire the engine
  let config = Config::from_env()?;
  let engine = Engine::bootstrap(config)?;

  // Execute command
  let outcome = match cli.command {
    Commands::Fetch(cmd) => fetch::execute(cmd, &engine).await,
    Commands::Quote(cmd) => quote::execute(cmd, &engine).await,
    Commands::Index(cmd) => index::execute(cmd, &engine).await,
    Commands::SyncAll(cmd) => sync_all::execute(cmd, &engine).await,
    Commands::Search(cmd) => search::execute(cmd, &engine).await,
    Commands::Stats => stats::execute(&engine).await,
  };

  engine.shutdown().await;
  outcome
}
