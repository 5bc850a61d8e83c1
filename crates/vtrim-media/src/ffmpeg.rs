//! FFmpeg CLI runtime.
//!
//! "Fetching the script" resolves the ffmpeg binary on the host; an
//! instance owns a private temporary directory as its working namespace.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{MediaError, MediaResult};
use crate::runtime::{RuntimeConfig, RuntimeProvider, TranscoderRuntime};

/// Characters of stderr kept in failure messages.
const STDERR_TAIL: usize = 2000;

/// Provides [`FfmpegRuntime`] instances.
#[derive(Debug)]
pub struct FfmpegProvider {
    ffmpeg_path: String,
    ffprobe_path: String,
    resolved: OnceLock<PathBuf>,
}

impl FfmpegProvider {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            resolved: OnceLock::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.ffmpeg_path, &config.ffprobe_path)
    }
}

#[async_trait]
impl RuntimeProvider for FfmpegProvider {
    async fn load_script(&self) -> MediaResult<()> {
        if self.resolved.get().is_some() {
            return Ok(());
        }
        let path = which::which(&self.ffmpeg_path)
            .map_err(|_| MediaError::FfmpegNotFound(self.ffmpeg_path.clone()))?;
        info!("Resolved ffmpeg at {}", path.display());
        let _ = self.resolved.set(path);
        Ok(())
    }

    fn create_instance(&self, config: &RuntimeConfig) -> MediaResult<Box<dyn TranscoderRuntime>> {
        let ffmpeg = self
            .resolved
            .get()
            .cloned()
            .ok_or_else(|| MediaError::FfmpegNotFound(self.ffmpeg_path.clone()))?;
        let ffprobe = which::which(&self.ffprobe_path).ok();
        if ffprobe.is_none() {
            warn!("ffprobe not found, clip durations will be estimated");
        }

        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("vtrim-");
            b
        };
        let workspace = match &config.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)?
            }
            None => builder.tempdir()?,
        };
        debug!("Created working namespace {}", workspace.path().display());

        Ok(Box::new(FfmpegRuntime {
            ffmpeg,
            ffprobe,
            workspace,
            timeout: config.command_timeout,
            loaded: false,
        }))
    }
}

/// FFmpeg runtime instance bound to one working directory.
#[derive(Debug)]
pub struct FfmpegRuntime {
    ffmpeg: PathBuf,
    ffprobe: Option<PathBuf>,
    workspace: TempDir,
    timeout: Option<Duration>,
    loaded: bool,
}

impl FfmpegRuntime {
    /// Resolve a namespace name to a host path, rejecting anything that
    /// could escape the working directory.
    fn resolve(&self, name: &str) -> MediaResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\');
        if !valid {
            return Err(MediaError::InvalidFileName(name.to_string()));
        }
        Ok(self.workspace.path().join(name))
    }

    fn ensure_loaded(&self) -> MediaResult<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(MediaError::RuntimeNotLoaded)
        }
    }
}

#[async_trait]
impl TranscoderRuntime for FfmpegRuntime {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    async fn load(&mut self) -> MediaResult<()> {
        let output = Command::new(&self.ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::ffmpeg_failed(
                "ffmpeg -version failed",
                Some(tail(&output.stderr)),
                output.status.code(),
            ));
        }

        let banner = String::from_utf8_lossy(&output.stdout);
        debug!("Loaded {}", banner.lines().next().unwrap_or("ffmpeg"));
        self.loaded = true;
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> MediaResult<Bytes> {
        let path = self.resolve(name)?;
        Ok(Bytes::from(tokio::fs::read(path).await?))
    }

    async fn unlink(&self, name: &str) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    async fn run(&self, args: &[String]) -> MediaResult<()> {
        self.ensure_loaded()?;
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let child = Command::new(&self.ffmpeg)
            .args(args)
            .current_dir(self.workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    // Dropping the future drops the child, which kills it.
                    warn!("FFmpeg timed out after {} seconds, killing process", timeout.as_secs());
                    return Err(MediaError::Timeout(timeout.as_secs()));
                }
            },
            None => child.wait_with_output().await?,
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(tail(&output.stderr)),
                output.status.code(),
            ))
        }
    }

    async fn probe_duration(&self, name: &str) -> MediaResult<Option<f64>> {
        let Some(ffprobe) = &self.ffprobe else {
            return Ok(None);
        };
        let path = self.resolve(name)?;

        let output = Command::new(ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            warn!("ffprobe failed for {}", name);
            return Ok(None);
        }

        parse_probe_duration(&output.stdout)
    }
}

/// Measure the duration of a file on the host with ffprobe.
pub async fn probe_source_duration(ffprobe_path: &str, path: &Path) -> MediaResult<f64> {
    let ffprobe = which::which(ffprobe_path)
        .map_err(|_| MediaError::FfmpegNotFound(ffprobe_path.to_string()))?;

    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffmpeg_failed(
            format!("ffprobe failed for {}", path.display()),
            Some(tail(&output.stderr)),
            output.status.code(),
        ));
    }

    parse_probe_duration(&output.stdout)?
        .ok_or_else(|| MediaError::internal(format!("no duration reported for {}", path.display())))
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn parse_probe_duration(stdout: &[u8]) -> MediaResult<Option<f64>> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;
    Ok(probe
        .format
        .duration
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0))
}

fn tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let start = text
        .char_indices()
        .rev()
        .nth(STDERR_TAIL - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    text[start..].to_string()
}
