//! Scratch file and session guards
//!
//! Both types own something on disk and remove it when dropped, so a request
//! that fails halfway (or whose future is dropped) leaves nothing behind.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::{self, File, OpenOptions};

/// A file in the temp scratch directory, deleted on drop.
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
    size_bytes: u64,
}

impl ScratchFile {
    /// Create an empty file in `dir`. The name is `{prefix}{random}{suffix}`,
    /// so concurrent requests for the same upload never collide.
    pub fn create_in(dir: &Path, prefix: &str, suffix: &str) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)?;
        Ok(Self {
            path: file.into_temp_path(),
            size_bytes: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Open the file for writing, truncating anything written before.
    pub async fn open_writer(&self) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .await
    }

    /// Record how many bytes the writer produced.
    pub fn set_size_bytes(&mut self, size_bytes: u64) {
        self.size_bytes = size_bytes;
    }

    /// Delete the file now and report failures, instead of the silent removal on drop.
    pub async fn remove(self) -> io::Result<()> {
        let path = self.path.to_path_buf();
        // Keep TempPath from trying again after we removed it ourselves.
        let _ = self.path.keep();
        match fs::remove_file(&path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Owns an upload session directory and removes it on drop.
#[derive(Debug)]
pub struct SessionGuard {
    dir: PathBuf,
    armed: bool,
}

impl SessionGuard {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            armed: true,
        }
    }

    /// Leave the session on disk, e.g. once it has already been removed.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let dir = std::mem::take(&mut self.dir);
        // Inside a runtime the removal must not block a worker thread.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_session_dir(&dir));
            }
            Err(_) => remove_session_dir(&dir),
        }
    }
}

fn remove_session_dir(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            tracing::debug!(path = %dir.display(), "Upload session removed");
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(
                path = %dir.display(),
                error = %e,
                "Failed to remove upload session directory"
            );
        }
    }
}
