//! Finish handler: assemble a chunked upload and relay it.

use crate::error::HttpAppError;
use crate::extract::FormOrJson;
use crate::handlers::{discard_scratch, non_blank, UploadedResponse};
use crate::state::AppState;
use axum::{extract::State, Json};
use fatbox_core::{AppError, Destination, ForwardRequest, UploadId};
use fatbox_storage::NO_CHUNKS_MESSAGE;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

pub const MISSING_FINISH_FIELDS: &str = "Missing uploadId, filename, or destination";
pub const UPLOAD_FAILED: &str = "Upload failed";

/// Accepted as an urlencoded form or as JSON. Every field is optional at the
/// parsing level so missing fields produce our own 400 message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishUploadRequest {
    pub upload_id: Option<String>,
    pub filename: Option<String>,
    pub destination: Option<String>,
    pub userhash: Option<String>,
    pub time: Option<String>,
}

/// Assemble every chunk of `uploadId` in index order and send the result to
/// the chosen host.
pub async fn finish_upload(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<FinishUploadRequest>,
) -> Result<Json<UploadedResponse>, HttpAppError> {
    relay_session(&state, request)
        .await
        .map(|url| Json(UploadedResponse { url }))
        .map_err(|e| HttpAppError::from(e).with_context(UPLOAD_FAILED))
}

async fn relay_session(state: &AppState, request: FinishUploadRequest) -> Result<String, AppError> {
    let (Some(raw_upload_id), Some(filename), Some(raw_destination)) = (
        non_blank(request.upload_id),
        non_blank(request.filename),
        non_blank(request.destination),
    ) else {
        return Err(AppError::InvalidInput(MISSING_FINISH_FIELDS.to_string()));
    };

    let destination: Destination = raw_destination.parse()?;
    let upload_id = UploadId::parse(&raw_upload_id)?;

    if !state.store.session_exists(&upload_id).await? {
        return Err(AppError::SessionNotFound(NO_CHUNKS_MESSAGE.to_string()));
    }

    // From here on the session is removed whatever happens, even if this
    // future is dropped mid-way.
    let mut session = state.store.begin_session(&upload_id);
    let start = Instant::now();

    let assembled = state.store.assemble(&upload_id, &filename).await?;
    let size_bytes = assembled.size_bytes();

    let forward_request = ForwardRequest::new(destination, assembled.path(), filename.as_str())
        .with_userhash(request.userhash)
        .with_time(request.time);

    let result = state.forwarder.forward(&forward_request).await;

    discard_scratch(assembled).await;
    match state.store.discard_session(&upload_id).await {
        Ok(()) => session.disarm(),
        Err(e) => {
            tracing::warn!(upload_id = %upload_id, error = %e, "Failed to remove upload session");
        }
    }

    let url = result?;

    tracing::info!(
        upload_id = %upload_id,
        destination = %destination,
        filename = %filename,
        size_bytes = size_bytes,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Chunked upload relayed"
    );

    Ok(url)
}
