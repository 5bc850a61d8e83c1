#![deny(unreachable_patterns)]
//! Clip transcoding for the VTrim pipeline.
//!
//! This crate provides:
//! - A capability interface over the transcoder runtime (script, instance,
//!   working namespace, command invocation)
//! - An FFmpeg CLI implementation of that interface
//! - Runtime acquisition with a bounded retry policy
//! - The ordered per-clip stream-copy trim loop

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffmpeg;
pub mod retry;
pub mod runtime;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trim;

pub use command::FfmpegCommand;
pub use config::EngineConfig;
pub use engine::{EngineState, TranscodeEngine};
pub use error::{MediaError, MediaResult};
pub use ffmpeg::{probe_source_duration, FfmpegProvider, FfmpegRuntime};
pub use retry::{retry_with_state, RetryPolicy, RetryResult};
pub use runtime::{RuntimeConfig, RuntimeProvider, TranscoderRuntime};
pub use trim::{plan_trims, TrimPlan};
