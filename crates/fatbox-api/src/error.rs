//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`. Use
//! `AppError` (or types that implement `Into<AppError>`) for errors so they become
//! `HttpAppError` and render consistently (status, body, logging). Handlers that
//! relay uploads attach their generic failure message with [`HttpAppError::with_context`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fatbox_core::{AppError, ErrorMetadata, LogLevel};
use fatbox_storage::StorageError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from fatbox-core)
#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    /// Replaces the message of server-side failures, e.g. "Upload failed"
    context: Option<&'static str>,
}

impl HttpAppError {
    pub fn with_context(mut self, context: &'static str) -> Self {
        self.context = Some(context);
        self
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn body(&self) -> ErrorResponse {
        let error = &self.error;

        // Client errors explain themselves; server errors get the operation's
        // message with the underlying failure (including any upstream body) in details.
        if error.is_client_error() {
            ErrorResponse {
                error: error.client_message(),
                details: None,
                code: error.error_code().to_string(),
                recoverable: error.is_recoverable(),
            }
        } else {
            ErrorResponse {
                error: self
                    .context
                    .map(str::to_string)
                    .unwrap_or_else(|| error.client_message()),
                details: Some(error.detailed_message()),
                code: error.error_code().to_string(),
                recoverable: error.is_recoverable(),
            }
        }
    }
}

impl From<AppError> for HttpAppError {
    fn from(error: AppError) -> Self {
        HttpAppError {
            error,
            context: None,
        }
    }
}

// Convert domain errors to HttpAppError through AppError

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError::from(AppError::from(err))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, code = code, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, code = code, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_type = error_type,
                code = code,
                "Error occurred"
            );
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        log_error(&self.error);
        (self.status(), Json(self.body())).into_response()
    }
}
