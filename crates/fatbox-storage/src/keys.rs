//! File naming inside the scratch directories.
//!
//! Chunks live at `uploads/{upload_id}/chunk_{index}`. Scratch files live in
//! `temp/` and are named `{upload_id}-{random}-{display_name}` with both
//! caller-supplied parts sanitized and shortened.

use fatbox_core::{ChunkIndex, UploadId};

pub const CHUNK_FILE_PREFIX: &str = "chunk_";

const MAX_NAME_PART: usize = 64;

pub fn chunk_file_name(index: ChunkIndex) -> String {
    format!("{}{}", CHUNK_FILE_PREFIX, index)
}

/// Parse `chunk_{index}`. Anything else (including in-flight `.chunk_*` part
/// files) is not a chunk.
pub fn parse_chunk_file_name(name: &str) -> Option<ChunkIndex> {
    let digits = name.strip_prefix(CHUNK_FILE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(ChunkIndex)
}

/// Private file a chunk is written to before it replaces `chunk_{index}`.
pub fn chunk_part_file_name(index: ChunkIndex, nonce: &str) -> String {
    format!(".{}{}.{}.part", CHUNK_FILE_PREFIX, index, nonce)
}

pub fn scratch_prefix(upload_id: Option<&UploadId>) -> String {
    match upload_id {
        Some(id) => format!("{}-", sanitize_name_part(id.as_str())),
        None => "direct-".to_string(),
    }
}

pub fn scratch_suffix(display_name: &str) -> String {
    let name = sanitize_name_part(display_name);
    if name.is_empty() {
        String::new()
    } else {
        format!("-{}", name)
    }
}

fn sanitize_name_part(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");
    base.chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_PART)
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
