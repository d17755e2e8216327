//! CLI `embed` command: warm the embedding cache, or rebuild it with `--force`.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::CareerMatchConfig;
use crate::embedding;
use crate::recommend::store_from_config;
use crate::store::CacheOutcome;

pub async fn embed(config: &CareerMatchConfig, force: bool) -> Result<()> {
    let catalog = Catalog::load(config.resolved_catalog_path())?;
    let provider: Arc<dyn embedding::EmbeddingProvider> = Arc::from(
        embedding::create_provider(&config.embedding)
            .context("failed to create embedding provider")?,
    );
    let store = store_from_config(config);

    println!(
        "Embedding {} careers with model '{}'...",
        catalog.len(),
        config.embedding.model
    );

    let init = tokio::task::spawn_blocking(move || {
        if force {
            store.rebuild(&catalog, provider.as_ref())
        } else {
            store.initialize(&catalog, provider.as_ref())
        }
    })
    .await??;

    match &init.outcome {
        CacheOutcome::Hit => println!("Cache is current ({} rows); nothing to do.", init.matrix.rows()),
        CacheOutcome::Miss(reason) => {
            println!("Recomputed {} embeddings ({reason}).", init.matrix.rows())
        }
        CacheOutcome::Rebuilt => println!("Rebuilt {} embeddings.", init.matrix.rows()),
    }

    if let Some(warning) = &init.persistence {
        anyhow::bail!("{warning}");
    }
    println!("Cache: {}", config.resolved_cache_db_path().display());
    Ok(())
}
