//! CLI `cache clear` command.

use anyhow::Result;

use crate::config::CareerMatchConfig;
use crate::recommend::store_from_config;

/// Delete the persisted embeddings. The next start recomputes them.
pub fn clear(config: &CareerMatchConfig) -> Result<()> {
    let store = store_from_config(config);
    if store.clear()? {
        println!("Embedding cache cleared: {}", store.db_path().display());
    } else {
        println!("No cached embeddings at {}", store.db_path().display());
    }
    Ok(())
}
