//! Chunk upload handler.
//!
//! Each request carries one chunk of a larger file. Chunks are kept on disk
//! until the matching `/finish` request assembles them.

use crate::error::HttpAppError;
use crate::handlers::{multipart_error, non_blank};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use fatbox_core::{AppError, ChunkIndex, UploadId};
use serde::Serialize;
use std::sync::Arc;

pub const MISSING_CHUNK_FIELDS: &str = "Missing uploadId or index";
pub const MISSING_CHUNK_DATA: &str = "Missing chunk data";

#[derive(Debug, Serialize)]
pub struct ChunkReceivedResponse {
    pub message: String,
}

/// Fields of a chunk form. Parts may arrive in any order, so everything is
/// collected before validation.
#[derive(Default)]
struct ChunkForm {
    upload_id: Option<String>,
    index: Option<String>,
    chunk: Option<Bytes>,
}

async fn read_chunk_form(mut multipart: Multipart) -> Result<ChunkForm, AppError> {
    let mut form = ChunkForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match field_name.as_str() {
            "uploadId" => form.upload_id = Some(field.text().await.map_err(multipart_error)?),
            "index" => form.index = Some(field.text().await.map_err(multipart_error)?),
            "chunk" => {
                if form.chunk.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple chunk fields are not allowed; send exactly one field named 'chunk'"
                            .to_string(),
                    ));
                }
                form.chunk = Some(field.bytes().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Store one chunk of an upload session.
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ChunkReceivedResponse>, HttpAppError> {
    let form = read_chunk_form(multipart).await?;

    let (Some(raw_upload_id), Some(raw_index)) = (
        non_blank(form.upload_id),
        non_blank(form.index),
    ) else {
        return Err(AppError::InvalidInput(MISSING_CHUNK_FIELDS.to_string()).into());
    };

    let upload_id = UploadId::parse(&raw_upload_id)?;
    let index: ChunkIndex = raw_index.parse()?;
    let chunk = form
        .chunk
        .ok_or_else(|| AppError::InvalidInput(MISSING_CHUNK_DATA.to_string()))?;

    state.store.put_chunk(&upload_id, index, chunk).await?;

    tracing::info!(
        upload_id = %upload_id,
        chunk_index = index.value(),
        "Chunk received"
    );

    Ok(Json(ChunkReceivedResponse {
        message: format!("Chunk {} for {} received.", index, upload_id),
    }))
}
