//! Fatbox API Library
//!
//! This crate provides the HTTP handlers, error rendering, and application setup
//! for the upload relay.

mod handlers;
mod telemetry;

// Public modules
pub mod error;
pub mod extract;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use handlers::health::LIVENESS_TEXT;
