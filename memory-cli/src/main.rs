//! memctl: run the semantic memory demo, list collections, search by text. Config from a JSON
//! file (`--config`) or env.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use memory_cli::commands;
use memory_cli::logger::init_tracing;
use memory_cli::{AppConfig, Backend, Cli, Commands};
use semantic_memory::SemanticMemory;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_file = std::env::var("LOG_FILE").ok();
    init_tracing(log_file.as_deref())?;

    let config = AppConfig::load(cli.config.as_deref()).context("Load application config")?;
    let backend = Backend::open(&config).await?;

    let result = run(cli.command, &config, &backend).await;
    backend.close().await;
    result
}

async fn run(command: Commands, config: &AppConfig, backend: &Backend) -> Result<()> {
    let mut out = io::stdout();

    match &command {
        Commands::Index {
            collection,
            index_type,
        } => return commands::index(backend, collection, (*index_type).into()).await,
        Commands::Collections => {
            return commands::collections(backend.store().as_ref(), &mut out).await
        }
        _ => {}
    }

    let memory = SemanticMemory::new(backend.store(), commands::embedder(config)?);
    match command {
        Commands::Demo { collection } => commands::demo(&memory, &collection, &mut out).await,
        Commands::Search {
            collection,
            query,
            limit,
            min_relevance,
        } => commands::search(&memory, &collection, &query, limit, min_relevance, &mut out).await,
        Commands::Index { .. } | Commands::Collections => Ok(()),
    }
}
