//! Outbound service initialization

use anyhow::{Context, Result};
use fatbox_core::Config;
use fatbox_services::{Forwarder, HostingClient};
use std::sync::Arc;

/// Build the hosting client used to relay uploads.
pub fn setup_forwarder(config: &Config) -> Result<Arc<dyn Forwarder>> {
    let client = HostingClient::new(config.endpoints.clone(), &config.upstream)
        .context("Failed to initialize hosting client")?;

    tracing::info!(
        pomf = %config.endpoints.pomf_upload_url,
        catbox = %config.endpoints.catbox_api_url,
        litterbox = %config.endpoints.litterbox_api_url,
        timeout_secs = config.upstream.timeout.as_secs(),
        max_retries = config.upstream.max_retries,
        "Hosting client initialized"
    );

    Ok(Arc::new(client))
}
