mod catalog;
mod cli;
mod config;
mod db;
mod embedding;
mod error;
mod recommend;
mod server;
mod store;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "careermatch", version, about = "Semantic career recommender")]
struct Cli {
    /// Config file (defaults to ~/.careermatch/config.toml)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Override the configured transport: "stdio" or "sse"
        #[arg(long)]
        transport: Option<String>,
    },
    /// Recommend careers for free-text quiz answers
    Recommend {
        /// Quiz answers
        query: String,
        /// Number of careers to return
        #[arg(short = 'n', long, allow_hyphen_values = true)]
        top_n: Option<i64>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Build the embedding cache for the current catalog
    Embed {
        /// Recompute even if the cache is valid
        #[arg(long)]
        force: bool,
    },
    /// Manage the embedding cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Check catalog, model files and cache
    Doctor,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete the persisted embeddings
    Clear,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.careermatch/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::CareerMatchConfig::load_from(path)?,
        None => config::CareerMatchConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or_else(|| config.server.transport.clone());
            match transport.as_str() {
                "stdio" => server::serve_stdio(config).await?,
                "sse" => server::serve_sse(config).await?,
                other => anyhow::bail!("unknown transport: {other}. Supported: stdio, sse"),
            }
        }
        Command::Recommend { query, top_n, json } => {
            cli::recommend::recommend(&config, &query, top_n, json).await?;
        }
        Command::Embed { force } => {
            cli::embed::embed(&config, force).await?;
        }
        Command::Cache { action } => match action {
            CacheAction::Clear => cli::cache::clear(&config)?,
        },
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
    }

    Ok(())
}
