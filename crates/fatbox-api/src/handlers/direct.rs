//! Direct upload handler: relay a single file without chunking.

use crate::error::HttpAppError;
use crate::handlers::{discard_scratch, multipart_error, non_blank, UploadedResponse};
use crate::state::AppState;
use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use fatbox_core::{AppError, Destination, ForwardRequest};
use fatbox_storage::{ChunkStore, ScratchFile};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

pub const MISSING_DIRECT_FIELDS: &str = "Missing file or destination";
pub const DIRECT_UPLOAD_FAILED: &str = "Direct upload failed";
pub const DEFAULT_DISPLAY_NAME: &str = "upload.dat";

#[derive(Default)]
struct DirectForm {
    file: Option<(ScratchFile, String)>,
    destination: Option<String>,
    userhash: Option<String>,
    time: Option<String>,
}

/// Stream a file part straight into a scratch file.
async fn spool_file(store: &dyn ChunkStore, mut field: Field<'_>) -> Result<(ScratchFile, String), AppError> {
    let display_name = field
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME)
        .to_string();

    let mut scratch = store.create_scratch_file(&display_name).await?;
    let mut writer = scratch.open_writer().await?;
    let mut size_bytes: u64 = 0;

    while let Some(bytes) = field.chunk().await.map_err(multipart_error)? {
        writer.write_all(&bytes).await?;
        size_bytes += bytes.len() as u64;
    }
    writer.flush().await?;
    drop(writer);

    scratch.set_size_bytes(size_bytes);
    Ok((scratch, display_name))
}

async fn read_direct_form(store: &dyn ChunkStore, mut multipart: Multipart) -> Result<DirectForm, AppError> {
    let mut form = DirectForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match field_name.as_str() {
            "file" => {
                if form.file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                form.file = Some(spool_file(store, field).await?);
            }
            "destination" => form.destination = Some(field.text().await.map_err(multipart_error)?),
            "userhash" => form.userhash = Some(field.text().await.map_err(multipart_error)?),
            "time" => form.time = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    Ok(form)
}

/// Relay one multipart file to the chosen host.
pub async fn direct_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadedResponse>, HttpAppError> {
    relay_file(&state, multipart)
        .await
        .map(|url| Json(UploadedResponse { url }))
        .map_err(|e| HttpAppError::from(e).with_context(DIRECT_UPLOAD_FAILED))
}

async fn relay_file(state: &AppState, multipart: Multipart) -> Result<String, AppError> {
    // Any scratch file already spooled is dropped (and deleted) on early return.
    let form = read_direct_form(state.store.as_ref(), multipart).await?;

    let (Some((scratch, display_name)), Some(raw_destination)) =
        (form.file, non_blank(form.destination))
    else {
        return Err(AppError::InvalidInput(MISSING_DIRECT_FIELDS.to_string()));
    };

    let destination: Destination = raw_destination.parse()?;
    let start = Instant::now();
    let size_bytes = scratch.size_bytes();

    let request = ForwardRequest::new(destination, scratch.path(), display_name.as_str())
        .with_userhash(form.userhash)
        .with_time(form.time);

    let result = state.forwarder.forward(&request).await;
    discard_scratch(scratch).await;
    let url = result?;

    tracing::info!(
        destination = %destination,
        display_name = %display_name,
        size_bytes = size_bytes,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Direct upload relayed"
    );

    Ok(url)
}
