//! Pipeline lifecycle for the VTrim clip tool.
//!
//! A [`PipelineRun`] owns one source video, its clip timeline, the trimmed
//! artifacts and the phase machine that decides which of them may change.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod run;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use lifecycle::{Lifecycle, LifecycleEvent};
pub use logging::RunLogger;
pub use run::PipelineRun;
