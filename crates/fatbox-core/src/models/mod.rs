//! Data models for the application
//!
//! Upload identifiers and chunk indices arrive as untrusted form fields, so
//! each is parsed into a newtype that can only hold a valid value.

mod destination;
mod upload;

pub use destination::{Destination, DEFAULT_LITTERBOX_TIME};
pub use upload::{ChunkIndex, ForwardRequest, UploadId, MAX_UPLOAD_ID_LENGTH};
