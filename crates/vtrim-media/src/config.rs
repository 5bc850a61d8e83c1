//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::runtime::RuntimeConfig;

/// Transcode engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// FFmpeg binary name or path
    pub ffmpeg_path: String,
    /// FFprobe binary name or path (duration probing)
    pub ffprobe_path: String,
    /// Parent directory for working namespaces
    pub work_dir: Option<PathBuf>,
    /// Per-clip command timeout
    pub clip_timeout: Duration,
    /// Policy for the proactive startup load
    pub preload_policy: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            work_dir: None,
            clip_timeout: Duration::from_secs(600),
            preload_policy: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ffmpeg_path: std::env::var("VTRIM_FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: std::env::var("VTRIM_FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            work_dir: std::env::var("VTRIM_WORK_DIR").ok().map(PathBuf::from),
            clip_timeout: Duration::from_secs(
                std::env::var("VTRIM_CLIP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            // The preload ceiling is fixed; only paths and timeouts come from the
            // environment.
            preload_policy: defaults.preload_policy,
        }
    }

    /// Settings for a runtime instance.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            work_dir: self.work_dir.clone(),
            command_timeout: Some(self.clip_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.preload_policy.max_attempts, 3);
        assert_eq!(config.preload_policy.base_delay, Duration::from_millis(1000));
        assert_eq!(config.preload_policy.max_delay, Duration::from_millis(5000));
        assert_eq!(config.runtime_config().command_timeout, Some(config.clip_timeout));
    }

    #[test]
    fn test_from_env_keeps_fixed_preload_policy() {
        let config = EngineConfig::from_env();
        assert_eq!(config.preload_policy, RetryPolicy::default());
    }
}
