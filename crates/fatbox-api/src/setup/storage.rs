//! Scratch storage setup and initialization

use anyhow::{Context, Result};
use fatbox_core::Config;
use fatbox_storage::{ChunkStore, LocalChunkStore};
use std::sync::Arc;

/// Create the scratch directories and the chunk store on top of them.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ChunkStore>> {
    tracing::info!(scratch_dir = %config.scratch_dir.display(), "Initializing scratch storage...");

    let store = LocalChunkStore::from_config(config)
        .await
        .context("Failed to initialize scratch storage")?;

    tracing::info!(
        uploads_dir = %store.uploads_dir().display(),
        temp_dir = %store.temp_dir().display(),
        "Scratch storage initialized successfully"
    );

    Ok(Arc::new(store))
}
