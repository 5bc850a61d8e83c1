//! Pipeline error types.

use thiserror::Error;
use vtrim_media::MediaError;
use vtrim_models::{ModelError, PipelinePhase};
use vtrim_timeline::TimelineError;
use vtrim_upload::UploadError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot {event} while {from}")]
    InvalidTransition {
        from: PipelinePhase,
        event: &'static str,
    },

    #[error("No source video loaded")]
    NoSource,

    #[error("No trimmed clips")]
    NoArtifacts,

    #[error("Clip {} does not exist", .0 + 1)]
    UnknownArtifact(usize),

    #[error("No upload target configured")]
    NoUploadTarget,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("File access error: {0}")]
    FileAccess(#[from] std::io::Error),
}

impl PipelineError {
    /// Errors reading or writing local files. These reset the run instead
    /// of returning to editing.
    pub fn is_file_access(&self) -> bool {
        match self {
            PipelineError::FileAccess(_) => true,
            PipelineError::Model(e) => e.is_file_access(),
            PipelineError::Media(e) => e.is_file_access(),
            _ => false,
        }
    }

    /// Zero-based clip index the error refers to, if any.
    pub fn clip_index(&self) -> Option<usize> {
        match self {
            PipelineError::Media(e) => e.clip_index(),
            PipelineError::Upload(e) => e.item_index(),
            PipelineError::UnknownArtifact(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether the user should be offered a transcoder retry.
    pub fn is_retryable_engine(&self) -> bool {
        matches!(self, PipelineError::Media(e) if e.is_engine_unavailable())
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Media(MediaError::EngineUnavailable(_)) => {
                "The video processor could not be loaded. Try again.".to_string()
            }
            PipelineError::Model(ModelError::FileTooLarge { .. }) => {
                "The video is too large. The limit is 1 GB.".to_string()
            }
            PipelineError::Model(ModelError::UnsupportedFormat(_)) => {
                "Only MP4 and WebM videos are supported.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_access_classification() {
        let io = || std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(PipelineError::FileAccess(io()).is_file_access());
        assert!(PipelineError::Model(ModelError::Io(io())).is_file_access());
        assert!(PipelineError::Media(MediaError::Io(io()).for_clip_file(0)).is_file_access());
        assert!(!PipelineError::Media(MediaError::InvalidClip(0)).is_file_access());
    }

    #[test]
    fn test_clip_index_passes_through() {
        let err = PipelineError::from(MediaError::EmptyOutput(2));
        assert_eq!(err.clip_index(), Some(2));
        assert_eq!(err.user_message(), "Clip 3 produced no output");

        let err = PipelineError::from(UploadError::item_failed(1, "nope"));
        assert_eq!(err.clip_index(), Some(1));
    }

    #[test]
    fn test_engine_unavailable_is_retryable() {
        let err = PipelineError::from(MediaError::engine_unavailable("ffmpeg missing"));
        assert!(err.is_retryable_engine());
        assert!(err.user_message().contains("Try again"));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = PipelineError::InvalidTransition {
            from: PipelinePhase::Uploading,
            event: "edit clips",
        };
        assert_eq!(err.to_string(), "Cannot edit clips while uploading");
    }
}
