//! Upload of trimmed clips to a configured backend.
//!
//! Two strategies, chosen by the shape of the [`UploadTarget`]:
//! - Bulk: one multipart request carrying every clip
//! - Two-phase: per clip, a media-creation request followed by a
//!   record-creation request that references it
//!
//! [`UploadTarget`]: vtrim_models::UploadTarget

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod response;

pub use config::UploadConfig;
pub use error::{UploadError, UploadResult};
pub use orchestrator::{UploadOrchestrator, UploadOutcome, UploadedItem};
pub use response::{MediaResponse, RecordMeta, RecordRequest, RecordResponse};
