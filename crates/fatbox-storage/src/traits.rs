//! Chunk store abstraction
//!
//! This module defines the ChunkStore trait that backs chunked uploads and the
//! scratch files used while a finished or direct upload is relayed.

use async_trait::async_trait;
use bytes::Bytes;
use fatbox_core::{AppError, ChunkIndex, UploadId};
use std::path::PathBuf;
use thiserror::Error;

use crate::scratch::{ScratchFile, SessionGuard};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Assembly failed: {0}")]
    AssemblyFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Client-facing message for a finish request without chunks
pub const NO_CHUNKS_MESSAGE: &str = "No chunks found for this uploadId";

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SessionNotFound(_) => {
                AppError::SessionNotFound(NO_CHUNKS_MESSAGE.to_string())
            }
            StorageError::IoError(e) => AppError::Io(e),
            StorageError::WriteFailed(msg) | StorageError::AssemblyFailed(msg) => {
                AppError::Io(std::io::Error::other(msg))
            }
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// One stored chunk of an upload session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    pub index: ChunkIndex,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Chunk store abstraction
///
/// Sessions are keyed by a validated [`UploadId`]. A session comes into being
/// with its first chunk and lives until it is discarded; nothing expires on
/// its own.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Write (or overwrite) the chunk at `index`, creating the session if needed.
    ///
    /// Concurrent writes of the same index are last-write-wins: each write lands
    /// in a private file that atomically replaces the previous chunk.
    async fn put_chunk(
        &self,
        upload_id: &UploadId,
        index: ChunkIndex,
        data: Bytes,
    ) -> StorageResult<()>;

    /// Whether a session directory exists for this upload
    async fn session_exists(&self, upload_id: &UploadId) -> StorageResult<bool>;

    /// Chunks of a session in ascending index order
    ///
    /// Returns `SessionNotFound` if the session does not exist. Files that are
    /// not chunk files are ignored.
    async fn list_chunks(&self, upload_id: &UploadId) -> StorageResult<Vec<ChunkEntry>>;

    /// Concatenate all chunks of a session, in index order, into a new scratch file.
    ///
    /// The session itself is left untouched; callers pair this with
    /// [`ChunkStore::begin_session`] so the session is removed afterwards.
    async fn assemble(&self, upload_id: &UploadId, display_name: &str)
        -> StorageResult<ScratchFile>;

    /// Remove a session and all its chunks. Removing a missing session is not an error.
    async fn discard_session(&self, upload_id: &UploadId) -> StorageResult<()>;

    /// Guard that removes the session directory when dropped
    fn begin_session(&self, upload_id: &UploadId) -> SessionGuard;

    /// Empty scratch file for a single-shot upload
    async fn create_scratch_file(&self, display_name: &str) -> StorageResult<ScratchFile>;
}
