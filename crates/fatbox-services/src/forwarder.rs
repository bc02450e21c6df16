//! Forwarder abstraction and its error type

use async_trait::async_trait;
use fatbox_core::{AppError, Destination, ForwardRequest};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("{destination} returned HTTP {status}")]
    Status {
        destination: Destination,
        status: u16,
        body: String,
    },

    #[error("{destination} rejected the upload: {reason}")]
    Rejected {
        destination: Destination,
        reason: String,
        body: String,
    },

    #[error("{destination} did not respond within {timeout_secs} seconds")]
    Timeout {
        destination: Destination,
        timeout_secs: u64,
    },

    #[error("request to {destination} failed: {source}")]
    Transport {
        destination: Destination,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ForwardError {
    /// Failures worth another attempt: timeouts, connection problems and 5xx answers.
    pub fn is_transient(&self) -> bool {
        match self {
            ForwardError::Timeout { .. } => true,
            ForwardError::Transport { source, .. } => source.is_connect() || source.is_timeout(),
            ForwardError::Status { status, .. } => *status >= 500,
            ForwardError::Rejected { .. } | ForwardError::File { .. } => false,
        }
    }
}

impl From<ForwardError> for AppError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Status {
                destination,
                status,
                body,
            } => AppError::Upstream {
                destination: destination.to_string(),
                message: format!("HTTP {}", status),
                body: Some(body),
            },
            ForwardError::Rejected {
                destination,
                reason,
                body,
            } => AppError::Upstream {
                destination: destination.to_string(),
                message: reason,
                body: Some(body),
            },
            ForwardError::Timeout {
                destination,
                timeout_secs,
            } => AppError::UpstreamTimeout {
                destination: destination.to_string(),
                timeout_secs,
            },
            ForwardError::Transport {
                destination,
                source,
            } => AppError::Upstream {
                destination: destination.to_string(),
                message: format!("request failed: {}", source),
                body: None,
            },
            ForwardError::File { path, source } => AppError::Io(io::Error::new(
                source.kind(),
                format!("{}: {}", path.display(), source),
            )),
        }
    }
}

/// Relays a local file to a hosting service and returns what the caller should
/// see: the public URL for pomf, the raw response body for catbox and litterbox.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: &ForwardRequest) -> Result<String, ForwardError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use fatbox_core::ErrorMetadata;

    #[test]
    fn transient_classification() {
        let status = |status| ForwardError::Status {
            destination: Destination::Catbox,
            status,
            body: String::new(),
        };
        assert!(status(502).is_transient());
        assert!(!status(413).is_transient());
        assert!(ForwardError::Timeout {
            destination: Destination::Pomf,
            timeout_secs: 1
        }
        .is_transient());
        assert!(!ForwardError::Rejected {
            destination: Destination::Pomf,
            reason: "success flag was false".into(),
            body: "{}".into()
        }
        .is_transient());
    }

    #[test]
    fn converts_into_app_errors() {
        let err: AppError = ForwardError::Status {
            destination: Destination::Litterbox,
            status: 500,
            body: "oops".into(),
        }
        .into();
        assert_eq!(err.error_code(), "UPSTREAM_ERROR");
        assert!(err.detailed_message().contains("litterbox upload failed: HTTP 500"));
        assert!(err.detailed_message().contains("oops"));

        let err: AppError = ForwardError::Timeout {
            destination: Destination::Catbox,
            timeout_secs: 5,
        }
        .into();
        assert_eq!(err.http_status_code(), 504);
    }
}
