//! Liveness text and the catch-all 404.

use axum::{
    http::{Method, StatusCode, Uri},
    Json,
};
use serde::Serialize;

pub const LIVENESS_TEXT: &str = "fatbox is working.";

pub async fn root() -> &'static str {
    LIVENESS_TEXT
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    pub message: String,
    pub error: &'static str,
    pub status_code: u16,
}

/// Fallback for every unmatched method and path.
pub async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<NotFoundResponse>) {
    tracing::debug!(method = %method, path = %uri.path(), "Route not found");
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            message: format!("Route {}:{} not found", method, uri.path()),
            error: "Not Found",
            status_code: StatusCode::NOT_FOUND.as_u16(),
        }),
    )
}
