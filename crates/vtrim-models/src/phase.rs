//! Pipeline phases.

use serde::{Deserialize, Serialize};

/// The single active phase of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    /// Waiting for a source video
    #[default]
    AwaitingUpload,
    /// Clip ranges are being edited
    EditingTimeline,
    /// Clips are being cut
    Transcoding,
    /// Trimmed artifacts are shown for review and renaming
    ReviewingResults,
    /// Artifacts are being pushed to the upload target
    Uploading,
    /// Upload finished; the run resets after a short display delay
    Completed,
    /// All state cleared
    Reset,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::AwaitingUpload => "awaiting_upload",
            PipelinePhase::EditingTimeline => "editing_timeline",
            PipelinePhase::Transcoding => "transcoding",
            PipelinePhase::ReviewingResults => "reviewing_results",
            PipelinePhase::Uploading => "uploading",
            PipelinePhase::Completed => "completed",
            PipelinePhase::Reset => "reset",
        }
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
