//! Error types module
//!
//! All failures that can reach a client are unified under [`AppError`]. Each
//! variant describes its own HTTP presentation through [`ErrorMetadata`], so the
//! HTTP layer renders every error the same way.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for upstream hosts misbehaving
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPSTREAM_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("{destination} upload failed: {message}")]
    Upstream {
        destination: String,
        message: String,
        /// Raw response body, when the host sent one
        body: Option<String>,
    },

    #[error("{destination} did not respond within {timeout_secs} seconds")]
    UpstreamTimeout {
        destination: String,
        timeout_secs: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::SessionNotFound(_) => (400, "SESSION_NOT_FOUND", false, LogLevel::Debug),
        AppError::Upstream { .. } => (500, "UPSTREAM_ERROR", true, LogLevel::Warn),
        AppError::UpstreamTimeout { .. } => (504, "UPSTREAM_TIMEOUT", true, LogLevel::Warn),
        AppError::Io(_) => (500, "IO_ERROR", true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", false, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::SessionNotFound(_) => "SessionNotFound",
            AppError::Upstream { .. } => "UpstreamError",
            AppError::UpstreamTimeout { .. } => "UpstreamTimeout",
            AppError::Io(_) => "IOError",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Whether the failure happened on the caller's side of the request
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status_code())
    }

    /// Get detailed error information including the upstream body and error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        if let AppError::Upstream {
            body: Some(body), ..
        } = self
        {
            if !body.is_empty() && !self.to_string().contains(body.as_str()) {
                details.push_str(": ");
                details.push_str(body);
            }
        }

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::SessionNotFound(ref msg) => msg.clone(),
            AppError::Upstream { destination, .. } => {
                format!("Upload to {} failed", destination)
            }
            AppError::UpstreamTimeout { destination, .. } => {
                format!("Upload to {} timed out", destination)
            }
            AppError::Io(_) => "Failed to access scratch storage".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}
