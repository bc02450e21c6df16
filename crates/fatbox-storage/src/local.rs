use crate::keys;
use crate::scratch::{ScratchFile, SessionGuard};
use crate::traits::{ChunkEntry, ChunkStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use fatbox_core::{ChunkIndex, Config, UploadId};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem chunk store
///
/// Layout under the scratch root:
/// - `uploads/{upload_id}/chunk_{index}` for received chunks
/// - `temp/` for assembled and direct-upload files
#[derive(Clone, Debug)]
pub struct LocalChunkStore {
    uploads_dir: PathBuf,
    temp_dir: PathBuf,
}

impl LocalChunkStore {
    /// Create a new LocalChunkStore, creating both scratch directories
    ///
    /// # Arguments
    /// * `scratch_root` - Directory holding `uploads/` and `temp/` (e.g. "/tmp")
    pub async fn new(scratch_root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = scratch_root.into();
        Self::with_dirs(root.join("uploads"), root.join("temp")).await
    }

    /// Create the store on the scratch directories named by `config`.
    pub async fn from_config(config: &Config) -> StorageResult<Self> {
        Self::with_dirs(config.uploads_dir(), config.temp_dir()).await
    }

    async fn with_dirs(uploads_dir: PathBuf, temp_dir: PathBuf) -> StorageResult<Self> {
        for dir in [&uploads_dir, &temp_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create scratch directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(LocalChunkStore {
            uploads_dir,
            temp_dir,
        })
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// UploadId already rejects separators and dot components, so the join
    /// cannot leave `uploads_dir`.
    fn session_dir(&self, upload_id: &UploadId) -> PathBuf {
        self.uploads_dir.join(upload_id.as_str())
    }

    fn new_scratch_file(
        &self,
        upload_id: Option<&UploadId>,
        display_name: &str,
    ) -> StorageResult<ScratchFile> {
        ScratchFile::create_in(
            &self.temp_dir,
            &keys::scratch_prefix(upload_id),
            &keys::scratch_suffix(display_name),
        )
        .map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create scratch file in {}: {}",
                self.temp_dir.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ChunkStore for LocalChunkStore {
    async fn put_chunk(
        &self,
        upload_id: &UploadId,
        index: ChunkIndex,
        data: Bytes,
    ) -> StorageResult<()> {
        let dir = self.session_dir(upload_id);
        let start = std::time::Instant::now();

        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create session directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let path = dir.join(keys::chunk_file_name(index));
        let part_path = dir.join(keys::chunk_part_file_name(
            index,
            &Uuid::new_v4().simple().to_string(),
        ));

        let write = async {
            let mut file = fs::File::create(&part_path).await?;
            file.write_all(&data).await?;
            file.flush().await?;
            drop(file);
            fs::rename(&part_path, &path).await
        };

        if let Err(e) = write.await {
            let _ = fs::remove_file(&part_path).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to write chunk {}: {}",
                path.display(),
                e
            )));
        }

        tracing::debug!(
            upload_id = %upload_id,
            chunk_index = index.value(),
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Chunk stored"
        );

        Ok(())
    }

    async fn session_exists(&self, upload_id: &UploadId) -> StorageResult<bool> {
        Ok(fs::try_exists(self.session_dir(upload_id)).await?)
    }

    async fn list_chunks(&self, upload_id: &UploadId) -> StorageResult<Vec<ChunkEntry>> {
        let dir = self.session_dir(upload_id);

        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::SessionNotFound(upload_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut chunks = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name();
            let Some(index) = name.to_str().and_then(keys::parse_chunk_file_name) else {
                continue;
            };
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            chunks.push(ChunkEntry {
                index,
                path: entry.path(),
                size_bytes: metadata.len(),
            });
        }

        chunks.sort_by_key(|c| c.index);
        Ok(chunks)
    }

    async fn assemble(
        &self,
        upload_id: &UploadId,
        display_name: &str,
    ) -> StorageResult<ScratchFile> {
        let chunks = self.list_chunks(upload_id).await?;
        if chunks.is_empty() {
            return Err(StorageError::SessionNotFound(upload_id.to_string()));
        }

        let start = std::time::Instant::now();
        let mut scratch = self.new_scratch_file(Some(upload_id), display_name)?;
        let mut output = scratch.open_writer().await?;
        let mut total_bytes: u64 = 0;

        for chunk in &chunks {
            // Whole chunk in memory; chunks are bounded by the request body limit.
            let data = fs::read(&chunk.path).await.map_err(|e| {
                StorageError::AssemblyFailed(format!(
                    "Failed to read chunk {}: {}",
                    chunk.path.display(),
                    e
                ))
            })?;
            output.write_all(&data).await.map_err(|e| {
                StorageError::AssemblyFailed(format!(
                    "Failed to append chunk {} to {}: {}",
                    chunk.index,
                    scratch.path().display(),
                    e
                ))
            })?;
            total_bytes += data.len() as u64;
        }

        output.flush().await?;
        output.sync_all().await?;
        drop(output);
        scratch.set_size_bytes(total_bytes);

        tracing::info!(
            upload_id = %upload_id,
            chunk_count = chunks.len(),
            size_bytes = total_bytes,
            path = %scratch.path().display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Chunks assembled"
        );

        Ok(scratch)
    }

    async fn discard_session(&self, upload_id: &UploadId) -> StorageResult<()> {
        match fs::remove_dir_all(self.session_dir(upload_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn begin_session(&self, upload_id: &UploadId) -> SessionGuard {
        SessionGuard::new(self.session_dir(upload_id))
    }

    async fn create_scratch_file(&self, display_name: &str) -> StorageResult<ScratchFile> {
        self.new_scratch_file(None, display_name)
    }
}
