//! Fatbox Storage Library
//!
//! This crate provides the chunk store used by chunked uploads and the scratch
//! files used while an upload is relayed to a hosting service.
//!
//! # Scratch layout
//!
//! Everything lives under one scratch root:
//!
//! - **Chunks**: `uploads/{upload_id}/chunk_{index}`
//! - **Assembled and direct files**: `temp/{upload_id|direct}-{random}-{name}`
//!
//! Upload ids are validated by `fatbox_core::UploadId` before they reach the
//! store, and file naming is centralized in the `keys` module.

pub(crate) mod keys;
pub mod local;
pub mod scratch;
pub mod traits;

// Re-export commonly used types
pub use local::LocalChunkStore;
pub use scratch::{ScratchFile, SessionGuard};
pub use traits::{ChunkEntry, ChunkStore, StorageError, StorageResult, NO_CHUNKS_MESSAGE};
