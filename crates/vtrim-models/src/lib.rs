//! Shared data models for the VTrim clip pipeline.
//!
//! This crate provides the types passed between pipeline stages:
//! - Clip ranges and trimmed artifacts
//! - Source media validation
//! - Upload targets
//! - Pipeline phases and progress reporting
//! - Duration labels and classification

pub mod clip;
pub mod error;
pub mod media;
pub mod phase;
pub mod progress;
pub mod run;
pub mod timestamp;
pub mod upload;

// Re-export common types
pub use clip::{ClipRange, SiteMode, TrimmedArtifact};
pub use error::{ModelError, ModelResult};
pub use media::{MediaFormat, SourceMedia, MAX_SOURCE_BYTES};
pub use phase::PipelinePhase;
pub use progress::{ProgressLog, ProgressSink, ProgressUpdate};
pub use run::RunId;
pub use timestamp::{classify_duration, format_duration_label, DurationClassification, DurationUnit};
pub use upload::UploadTarget;
