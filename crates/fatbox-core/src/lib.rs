//! Fatbox Core Library
//!
//! This crate provides the domain models, error types and configuration
//! shared by the storage, forwarding and HTTP layers.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, HostingEndpoints, LogFormat, UpstreamConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ChunkIndex, Destination, ForwardRequest, UploadId, DEFAULT_LITTERBOX_TIME};
