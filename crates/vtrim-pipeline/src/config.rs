//! Pipeline configuration.

use std::time::Duration;

use tracing::debug;
use vtrim_media::EngineConfig;
use vtrim_models::SiteMode;
use vtrim_upload::{UploadConfig, UploadError};

use crate::error::PipelineResult;

/// Delay between upload success and reset, so the success state is seen.
pub const RESET_DELAY: Duration = Duration::from_millis(800);

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Selects `video{n}` or `lesson{n}` default names
    pub site_mode: SiteMode,
    /// Pause between a completed upload and the reset
    pub reset_delay: Duration,
    pub engine: EngineConfig,
    /// Upload target, if one is configured
    pub upload: Option<UploadConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            site_mode: SiteMode::Video,
            reset_delay: RESET_DELAY,
            engine: EngineConfig::default(),
            upload: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    ///
    /// A missing upload target is not an error; malformed upload settings
    /// are.
    pub fn from_env() -> PipelineResult<Self> {
        let upload = match UploadConfig::from_env() {
            Ok(config) => Some(config),
            Err(UploadError::Config(reason)) => {
                debug!("No upload target: {}", reason);
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            site_mode: std::env::var("VTRIM_SITE_MODE")
                .map(|v| SiteMode::parse_lossy(&v))
                .unwrap_or_default(),
            reset_delay: RESET_DELAY,
            engine: EngineConfig::from_env(),
            upload,
        })
    }
}
