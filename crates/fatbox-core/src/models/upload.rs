use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use super::destination::{Destination, DEFAULT_LITTERBOX_TIME};
use crate::error::AppError;

/// Upload identifiers become directory names, so they share the filesystem's
/// usual component limit.
pub const MAX_UPLOAD_ID_LENGTH: usize = 255;

/// Caller-supplied identifier grouping the chunks of one logical file.
///
/// The value is opaque to the server but must be usable as a single path
/// component under the chunk scratch directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadId(String);

impl UploadId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.trim().is_empty() {
            return Err(AppError::InvalidInput("uploadId must not be blank".to_string()));
        }
        if raw.len() > MAX_UPLOAD_ID_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "uploadId must be at most {} bytes",
                MAX_UPLOAD_ID_LENGTH
            )));
        }
        if raw == "." || raw == ".." || raw.contains(['/', '\\', '\0']) {
            return Err(AppError::InvalidInput(
                "uploadId contains invalid characters".to_string(),
            ));
        }
        Ok(UploadId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UploadId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UploadId::parse(s)
    }
}

impl Display for UploadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UploadId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Position of a chunk within its upload. Sparse and non-zero-based indices are
/// allowed; only the numeric order matters at assembly time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkIndex(pub u64);

impl ChunkIndex {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl FromStr for ChunkIndex {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ChunkIndex).map_err(|_| {
            AppError::InvalidInput(format!(
                "index must be a non-negative integer, got '{}'",
                s
            ))
        })
    }
}

impl Display for ChunkIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Everything the forwarder needs to relay one local file to a host.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub destination: Destination,
    /// Local file whose bytes are sent
    pub path: PathBuf,
    /// File name announced to the host in the multipart part
    pub display_name: String,
    /// Catbox account hash; ignored by other hosts
    pub userhash: Option<String>,
    /// Litterbox retention (e.g. "1h", "12h", "24h", "72h"); ignored by other hosts
    pub time: String,
}

impl ForwardRequest {
    pub fn new(
        destination: Destination,
        path: impl Into<PathBuf>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            destination,
            path: path.into(),
            display_name: display_name.into(),
            userhash: None,
            time: DEFAULT_LITTERBOX_TIME.to_string(),
        }
    }

    /// Blank values are treated as absent.
    pub fn with_userhash(mut self, userhash: Option<String>) -> Self {
        self.userhash = userhash.filter(|h| !h.trim().is_empty());
        self
    }

    /// Blank values fall back to [`DEFAULT_LITTERBOX_TIME`].
    pub fn with_time(mut self, time: Option<String>) -> Self {
        self.time = time
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LITTERBOX_TIME.to_string());
        self
    }
}
