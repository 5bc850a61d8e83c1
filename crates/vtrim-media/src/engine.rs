//! Transcode engine: runtime acquisition and the per-clip trim loop.
//!
//! Acquisition moves through
//! `Unloaded -> ScriptFetching -> ScriptReady -> RuntimeLoading -> Ready`,
//! dropping into `Failed` when fetching or loading fails. A later
//! acquisition starts again from `Failed`, skipping the script fetch once
//! it has succeeded.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use vtrim_models::{ClipRange, ProgressSink, ProgressUpdate, SiteMode, SourceMedia, TrimmedArtifact};

use crate::config::EngineConfig;
use crate::error::{MediaError, MediaResult};
use crate::retry::{retry_with_state, RetryPolicy, RetryResult};
use crate::runtime::{RuntimeProvider, TranscoderRuntime};
use crate::trim::{plan_trims, TrimPlan};

/// Runtime acquisition state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Unloaded,
    ScriptFetching,
    ScriptReady,
    RuntimeLoading,
    Ready,
    Failed(String),
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Unloaded => "unloaded",
            EngineState::ScriptFetching => "script_fetching",
            EngineState::ScriptReady => "script_ready",
            EngineState::RuntimeLoading => "runtime_loading",
            EngineState::Ready => "ready",
            EngineState::Failed(_) => "failed",
        }
    }
}

/// Cuts clip ranges out of a source video with one runtime instance.
///
/// The runtime's working namespace belongs to this engine alone and is only
/// touched by the sequential trim loop.
pub struct TranscodeEngine {
    provider: Arc<dyn RuntimeProvider>,
    config: EngineConfig,
    state: EngineState,
    script_ready: bool,
    runtime: Option<Box<dyn TranscoderRuntime>>,
}

impl TranscodeEngine {
    pub fn new(provider: Arc<dyn RuntimeProvider>, config: EngineConfig) -> Self {
        Self {
            provider,
            config,
            state: EngineState::Unloaded,
            script_ready: false,
            runtime: None,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn transition(&mut self, next: EngineState) {
        debug!(from = self.state.as_str(), to = next.as_str(), "Engine state change");
        self.state = next;
    }

    fn fail(&mut self, err: MediaError) -> MediaError {
        self.transition(EngineState::Failed(err.to_string()));
        err
    }

    /// One pass through the acquisition state machine.
    async fn acquire(&mut self, attempt: u32) -> MediaResult<()> {
        if self.is_ready() {
            return Ok(());
        }
        metrics::counter!("vtrim_engine_load_attempts_total").increment(1);
        debug!(attempt, "Acquiring transcoder runtime");

        if !self.script_ready {
            self.transition(EngineState::ScriptFetching);
            if let Err(e) = self.provider.load_script().await {
                return Err(self.fail(e));
            }
            self.script_ready = true;
            self.transition(EngineState::ScriptReady);
        }

        self.transition(EngineState::RuntimeLoading);
        let mut runtime = match self.runtime.take() {
            Some(runtime) => runtime,
            None => match self.provider.create_instance(&self.config.runtime_config()) {
                Ok(runtime) => runtime,
                Err(e) => return Err(self.fail(e)),
            },
        };

        if !runtime.is_loaded() {
            if let Err(e) = runtime.load().await {
                self.runtime = Some(runtime);
                return Err(self.fail(e));
            }
        }

        self.runtime = Some(runtime);
        self.transition(EngineState::Ready);
        Ok(())
    }

    async fn acquire_with(
        &mut self,
        policy: &RetryPolicy,
        operation: &str,
    ) -> RetryResult<(), MediaError> {
        retry_with_state(policy, operation, self, |engine, attempt| {
            Box::pin(engine.acquire(attempt))
        })
        .await
    }

    /// Load the runtime ahead of time, retrying with backoff.
    ///
    /// Failure is logged and swallowed; trimming will try again on demand.
    pub async fn preload(&mut self) -> bool {
        let policy = self.config.preload_policy.clone();
        match self.acquire_with(&policy, "runtime_preload").await {
            RetryResult::Success { attempts, .. } => {
                info!(attempts, "Transcoder runtime preloaded");
                true
            }
            RetryResult::Failed { error, attempts } => {
                warn!(
                    attempts,
                    "Transcoder preload failed, deferring to on-demand load: {}", error
                );
                false
            }
        }
    }

    /// Make sure the runtime is ready, with a single attempt.
    pub async fn ensure_ready(&mut self) -> MediaResult<()> {
        if self.is_ready() {
            return Ok(());
        }
        self.acquire_with(&RetryPolicy::single(), "runtime_load")
            .await
            .into_result()
            .map_err(|e| MediaError::engine_unavailable(e.to_string()))
    }

    /// Explicit user retry after `EngineUnavailable`.
    pub async fn retry_load(&mut self) -> MediaResult<()> {
        info!("Retrying transcoder load on request");
        self.ensure_ready().await
    }

    /// Cut every range out of `source`, in order.
    ///
    /// The batch is validated before anything runs. The first failing clip
    /// aborts the batch and discards the artifacts already produced.
    /// Progress is reported after each finished clip.
    pub async fn trim_clips(
        &mut self,
        ranges: &[ClipRange],
        source: &SourceMedia,
        site_mode: SiteMode,
        progress: &dyn ProgressSink,
    ) -> MediaResult<Vec<TrimmedArtifact>> {
        let plans = plan_trims(ranges)?;
        self.ensure_ready().await?;

        let runtime = self.runtime.as_deref().ok_or(MediaError::RuntimeNotLoaded)?;
        let total = plans.len();
        let mut artifacts = Vec::with_capacity(total);

        info!(clips = total, format = %source.format, "Trimming clips");

        for plan in &plans {
            match trim_one(runtime, plan, source, site_mode).await {
                Ok(artifact) => {
                    metrics::counter!("vtrim_clips_transcoded_total").increment(1);
                    debug!(
                        clip = plan.index,
                        bytes = artifact.size(),
                        duration = artifact.duration_seconds,
                        "Clip trimmed"
                    );
                    artifacts.push(artifact);
                    progress.report(ProgressUpdate::new(artifacts.len(), total));
                }
                Err(e) => {
                    metrics::counter!("vtrim_clip_failures_total").increment(1);
                    error!(clip = plan.index, "Clip trim failed: {}", e);
                    return Err(match e {
                        MediaError::EmptyOutput(_)
                        | MediaError::ClipFailed { .. }
                        | MediaError::ClipFileAccess { .. } => e,
                        other => MediaError::clip_failed(plan.index, other.to_string()),
                    });
                }
            }
        }

        info!(clips = artifacts.len(), "All clips trimmed");
        Ok(artifacts)
    }
}

/// Cut one clip, always cleaning up its working files.
async fn trim_one(
    runtime: &dyn TranscoderRuntime,
    plan: &TrimPlan,
    source: &SourceMedia,
    site_mode: SiteMode,
) -> MediaResult<TrimmedArtifact> {
    let input = plan.input_name(source.format);
    let output = plan.output_name(source.format);

    let result = cut(runtime, plan, source, site_mode, &input, &output).await;

    for name in [&input, &output] {
        if let Err(e) = runtime.unlink(name).await {
            warn!(clip = plan.index, file = %name, "Failed to remove working file: {}", e);
        }
    }

    result
}

async fn cut(
    runtime: &dyn TranscoderRuntime,
    plan: &TrimPlan,
    source: &SourceMedia,
    site_mode: SiteMode,
    input: &str,
    output: &str,
) -> MediaResult<TrimmedArtifact> {
    runtime
        .write_file(input, &source.data)
        .await
        .map_err(|e| e.for_clip_file(plan.index))?;

    let args = plan.command(source.format).build_args();
    runtime.run(&args).await?;

    let data = runtime
        .read_file(output)
        .await
        .map_err(|e| e.for_clip_file(plan.index))?;
    if data.is_empty() {
        return Err(MediaError::EmptyOutput(plan.index));
    }

    let duration = match runtime.probe_duration(output).await {
        Ok(Some(measured)) => measured,
        Ok(None) => plan.duration() as f64,
        Err(e) => {
            warn!(clip = plan.index, "Duration probe failed, using cut length: {}", e);
            plan.duration() as f64
        }
    };

    Ok(TrimmedArtifact::new(
        site_mode.default_name(plan.index),
        plan.index,
        duration,
        source.mime_type(),
        data,
    ))
}
