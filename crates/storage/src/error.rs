//! Storage error types

use pdf_drawer_core::StrokeError;

/// Reasons a blob cannot be encoded or decoded
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("blob format version {0} is not supported")]
    UnsupportedVersion(u32),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
    #[error("invalid annotation data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid stroke: {0}")]
    Stroke(#[from] StrokeError),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("encoding error: {0}")]
    Codec(#[from] CodecError),
    #[error("stored entry {path} does not belong to key {key:?}")]
    KeyMismatch { path: String, key: String },
}

pub type StorageResult<T> = Result<T, StorageError>;
