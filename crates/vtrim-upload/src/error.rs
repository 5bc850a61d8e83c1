//! Upload error types.

use thiserror::Error;

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while uploading clips.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Bulk request rejected; carries the HTTP status text.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Malformed media response for clip {}: {reason}", .index + 1)]
    MalformedMediaResponse { index: usize, reason: String },

    #[error("Malformed record response for clip {}: {reason}", .index + 1)]
    MalformedRecordResponse { index: usize, reason: String },

    /// Two-phase item rejected; carries the backend's message.
    #[error("{message}")]
    ItemFailed { index: usize, message: String },

    #[error("No clips to upload")]
    NoArtifacts,

    #[error("Invalid header {0}")]
    InvalidHeader(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl UploadError {
    pub fn upload_failed(status_text: impl Into<String>) -> Self {
        Self::UploadFailed(status_text.into())
    }

    pub fn malformed_media(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedMediaResponse {
            index,
            reason: reason.into(),
        }
    }

    pub fn malformed_record(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecordResponse {
            index,
            reason: reason.into(),
        }
    }

    pub fn item_failed(index: usize, message: impl Into<String>) -> Self {
        Self::ItemFailed {
            index,
            message: message.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Zero-based clip index the error refers to, if any.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            UploadError::MalformedMediaResponse { index, .. }
            | UploadError::MalformedRecordResponse { index, .. }
            | UploadError::ItemFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}
