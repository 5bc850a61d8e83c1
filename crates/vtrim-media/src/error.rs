//! Error types for transcoding.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while acquiring the runtime or cutting clips.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found: {0}")]
    FfmpegNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Transcoder runtime is not loaded")]
    RuntimeNotLoaded,

    #[error("Transcoder unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Clip {} is empty after rounding to whole seconds", .0 + 1)]
    InvalidClip(usize),

    #[error("Clip {} produced no output", .0 + 1)]
    EmptyOutput(usize),

    #[error("Clip {} failed: {message}", .index + 1)]
    ClipFailed { index: usize, message: String },

    #[error("Clip {} could not access its working files: {source}", .index + 1)]
    ClipFileAccess {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid working file name: {0}")]
    InvalidFileName(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn engine_unavailable(reason: impl Into<String>) -> Self {
        Self::EngineUnavailable(reason.into())
    }

    pub fn clip_failed(index: usize, message: impl Into<String>) -> Self {
        Self::ClipFailed {
            index,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Zero-based clip index the error refers to, if any.
    pub fn clip_index(&self) -> Option<usize> {
        match self {
            MediaError::InvalidClip(i)
            | MediaError::EmptyOutput(i)
            | MediaError::ClipFailed { index: i, .. }
            | MediaError::ClipFileAccess { index: i, .. } => Some(*i),
            _ => None,
        }
    }

    /// Failed reads or writes of files, as opposed to transcoder failures.
    pub fn is_file_access(&self) -> bool {
        matches!(self, MediaError::Io(_) | MediaError::ClipFileAccess { .. })
    }

    /// Attach a clip index to an I/O failure on that clip's working files.
    pub fn for_clip_file(self, index: usize) -> Self {
        match self {
            MediaError::Io(source) => MediaError::ClipFileAccess { index, source },
            other => other,
        }
    }

    /// Whether the user should be offered a retry of runtime loading.
    pub fn is_engine_unavailable(&self) -> bool {
        matches!(self, MediaError::EngineUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_one_indexed() {
        assert_eq!(
            MediaError::InvalidClip(0).to_string(),
            "Clip 1 is empty after rounding to whole seconds"
        );
        assert_eq!(
            MediaError::clip_failed(2, "boom").to_string(),
            "Clip 3 failed: boom"
        );
    }

    #[test]
    fn test_clip_index() {
        assert_eq!(MediaError::EmptyOutput(4).clip_index(), Some(4));
        assert_eq!(MediaError::RuntimeNotLoaded.clip_index(), None);
    }

    #[test]
    fn test_io_on_clip_files_keeps_file_access() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = MediaError::from(io).for_clip_file(1);

        assert!(matches!(err, MediaError::ClipFileAccess { index: 1, .. }));
        assert!(err.is_file_access());
        assert_eq!(err.clip_index(), Some(1));
        assert!(!MediaError::clip_failed(1, "boom").for_clip_file(1).is_file_access());
    }
}
