//! Validation errors for shared models.

use thiserror::Error;

/// Result type for model validation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while constructing or validating models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("File too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub fn unsupported_format(what: impl Into<String>) -> Self {
        Self::UnsupportedFormat(what.into())
    }

    pub fn invalid_media(reason: impl Into<String>) -> Self {
        Self::InvalidMedia(reason.into())
    }

    /// Whether the error came from reading the source file itself.
    pub fn is_file_access(&self) -> bool {
        matches!(self, ModelError::Io(_))
    }
}
