//! HTTP handlers.

pub mod chunk;
pub mod direct;
pub mod finish;
pub mod health;

use axum::extract::multipart::MultipartError;
use fatbox_core::AppError;
use fatbox_storage::ScratchFile;
use serde::Serialize;

/// Successful relay: the public URL for pomf, the host's response body otherwise.
#[derive(Debug, Serialize)]
pub struct UploadedResponse {
    pub url: String,
}

pub(crate) fn multipart_error(e: MultipartError) -> AppError {
    AppError::InvalidInput(format!("Failed to read multipart: {}", e))
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Delete a scratch file now; the drop guard covers paths that never get here.
pub(crate) async fn discard_scratch(scratch: ScratchFile) {
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.remove().await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
    }
}
