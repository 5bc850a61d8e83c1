//! Transcoder runtime capability interface.
//!
//! The engine only needs a runtime that can be fetched once, instantiated,
//! loaded, given files in a private working namespace, and told to run a
//! command. Anything providing these operations can back the engine.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::MediaResult;

/// Settings passed when creating a runtime instance.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Parent directory for the working namespace (system temp if unset)
    pub work_dir: Option<PathBuf>,
    /// Upper bound on a single command invocation
    pub command_timeout: Option<Duration>,
}

/// Supplies runtime instances.
#[async_trait]
pub trait RuntimeProvider: Send + Sync {
    /// Fetch the runtime itself. The engine calls this until it first
    /// succeeds and never again afterwards.
    async fn load_script(&self) -> MediaResult<()>;

    /// Create an unloaded runtime instance.
    fn create_instance(&self, config: &RuntimeConfig) -> MediaResult<Box<dyn TranscoderRuntime>>;
}

/// One runtime instance with its own working namespace.
#[async_trait]
pub trait TranscoderRuntime: Send + Sync {
    fn is_loaded(&self) -> bool;

    async fn load(&mut self) -> MediaResult<()>;

    async fn write_file(&self, name: &str, data: &[u8]) -> MediaResult<()>;

    async fn read_file(&self, name: &str) -> MediaResult<Bytes>;

    async fn unlink(&self, name: &str) -> MediaResult<()>;

    /// Run one command with the given argument vector.
    async fn run(&self, args: &[String]) -> MediaResult<()>;

    /// Measured duration of a file in the namespace, when the runtime can
    /// probe it.
    async fn probe_duration(&self, _name: &str) -> MediaResult<Option<f64>> {
        Ok(None)
    }
}
