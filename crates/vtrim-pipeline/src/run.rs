//! One pipeline run: source video, clip timeline, trimmed artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;
use vtrim_media::{plan_trims, FfmpegProvider, TranscodeEngine};
use vtrim_models::{PipelinePhase, ProgressSink, RunId, SiteMode, SourceMedia, TrimmedArtifact};
use vtrim_timeline::ClipTimeline;
use vtrim_upload::{UploadOrchestrator, UploadOutcome};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::lifecycle::{Lifecycle, LifecycleEvent};
use crate::logging::RunLogger;

/// Sequences timeline editing, transcoding and upload for one source video.
pub struct PipelineRun {
    id: RunId,
    config: PipelineConfig,
    lifecycle: Lifecycle,
    engine: TranscodeEngine,
    uploader: Option<UploadOrchestrator>,
    source: Option<SourceMedia>,
    timeline: Option<ClipTimeline>,
    artifacts: Vec<TrimmedArtifact>,
    logger: RunLogger,
}

impl PipelineRun {
    pub fn new(
        config: PipelineConfig,
        engine: TranscodeEngine,
        uploader: Option<UploadOrchestrator>,
    ) -> Self {
        let id = RunId::new();
        let logger = RunLogger::new(id, "pipeline");
        Self {
            id,
            config,
            lifecycle: Lifecycle::new(),
            engine,
            uploader,
            source: None,
            timeline: None,
            artifacts: Vec::new(),
            logger,
        }
    }

    /// Build a run backed by the host ffmpeg and the configured upload
    /// target.
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let provider = Arc::new(FfmpegProvider::from_config(&config.engine));
        let engine = TranscodeEngine::new(provider, config.engine.clone());
        let uploader = config
            .upload
            .clone()
            .map(UploadOrchestrator::new)
            .transpose()?;
        Ok(Self::new(config, engine, uploader))
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn phase(&self) -> PipelinePhase {
        self.lifecycle.phase()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn site_mode(&self) -> SiteMode {
        self.config.site_mode
    }

    pub fn source(&self) -> Option<&SourceMedia> {
        self.source.as_ref()
    }

    pub fn timeline(&self) -> Option<&ClipTimeline> {
        self.timeline.as_ref()
    }

    pub fn artifacts(&self) -> &[TrimmedArtifact] {
        &self.artifacts
    }

    pub fn engine(&self) -> &TranscodeEngine {
        &self.engine
    }

    pub fn uploader(&self) -> Option<&UploadOrchestrator> {
        self.uploader.as_ref()
    }

    /// Load the transcoder in the background path: retried, never fatal.
    pub async fn preload(&mut self) -> bool {
        self.engine.preload().await
    }

    /// User-requested transcoder reload after `EngineUnavailable`.
    pub async fn retry_engine(&mut self) -> PipelineResult<()> {
        Ok(self.engine.retry_load().await?)
    }

    /// Accept a validated source video and start editing its timeline.
    pub async fn load_source(
        &mut self,
        source: SourceMedia,
        media_duration: f64,
    ) -> PipelineResult<()> {
        self.lifecycle.ensure(LifecycleEvent::MediaValidated)?;
        let timeline = ClipTimeline::initialize(media_duration)?;

        self.logger.source_loaded(&source, media_duration);
        self.advance(LifecycleEvent::MediaValidated)?;
        self.source = Some(source);
        self.timeline = Some(timeline);
        self.artifacts.clear();
        Ok(())
    }

    /// The timeline, while it is editable.
    pub fn timeline_mut(&mut self) -> PipelineResult<&mut ClipTimeline> {
        if self.phase() != PipelinePhase::EditingTimeline {
            return Err(PipelineError::InvalidTransition {
                from: self.phase(),
                event: LifecycleEvent::EditRequested.as_str(),
            });
        }
        self.timeline.as_mut().ok_or(PipelineError::NoSource)
    }

    /// Cut every clip range. On failure the run returns to editing with the
    /// ranges intact, or resets on file access errors.
    pub async fn transcode(
        &mut self,
        progress: &dyn ProgressSink,
    ) -> PipelineResult<&[TrimmedArtifact]> {
        self.lifecycle.ensure(LifecycleEvent::TrimRequested)?;
        let ranges = self
            .timeline
            .as_ref()
            .ok_or(PipelineError::NoSource)?
            .snapshot()?;
        plan_trims(&ranges)?;
        self.advance(LifecycleEvent::TrimRequested)?;

        let logger = self.logger.stage("transcode");
        logger.batch_started(ranges.len());

        let source = self.source.as_ref().ok_or(PipelineError::NoSource)?;
        let result = self
            .engine
            .trim_clips(&ranges, source, self.config.site_mode, progress)
            .instrument(logger.span())
            .await;

        match result {
            Ok(artifacts) => {
                self.artifacts = artifacts;
                self.advance(LifecycleEvent::TranscodeSucceeded)?;
                logger.batch_finished(self.artifacts.len());
                Ok(self.artifacts.as_slice())
            }
            Err(e) => {
                let err = PipelineError::from(e);
                logger.failed(&err);
                self.fail(err.is_file_access())?;
                Err(err)
            }
        }
    }

    /// Leave the results view and go back to editing the ranges.
    pub fn back_to_editing(&mut self) -> PipelineResult<()> {
        self.advance(LifecycleEvent::EditRequested)?;
        self.artifacts.clear();
        Ok(())
    }

    /// Set the name an artifact is uploaded under.
    pub fn rename_artifact(&mut self, index: usize, name: &str) -> PipelineResult<()> {
        if self.phase() != PipelinePhase::ReviewingResults {
            return Err(PipelineError::InvalidTransition {
                from: self.phase(),
                event: "rename clips",
            });
        }
        let artifact = self
            .artifacts
            .get_mut(index)
            .ok_or(PipelineError::UnknownArtifact(index))?;
        artifact.rename(name);
        Ok(())
    }

    /// Write the artifacts to `dir`, returning the written paths.
    pub async fn save_artifacts(&self, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
        if self.artifacts.is_empty() {
            return Err(PipelineError::NoArtifacts);
        }
        tokio::fs::create_dir_all(dir).await?;

        let mut written = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            let path = dir.join(artifact.file_name());
            tokio::fs::write(&path, &artifact.data).await?;
            written.push(path);
        }
        self.logger.artifacts_saved(written.len(), dir);
        Ok(written)
    }

    /// Upload the artifacts. After success the run shows the completed
    /// state for the reset delay, then resets.
    ///
    /// A failed bulk upload resets the run; a failed two-phase upload
    /// returns to editing. Clips already committed stay committed.
    pub async fn submit(&mut self, progress: &dyn ProgressSink) -> PipelineResult<UploadOutcome> {
        self.lifecycle.ensure(LifecycleEvent::SubmitRequested)?;
        if self.artifacts.is_empty() {
            return Err(PipelineError::NoArtifacts);
        }
        let strategy = self
            .uploader
            .as_ref()
            .map(UploadOrchestrator::strategy)
            .ok_or(PipelineError::NoUploadTarget)?;
        let logger = self.logger.stage("upload");
        logger.batch_started(self.artifacts.len());

        self.advance(LifecycleEvent::SubmitRequested)?;
        let Some(uploader) = self.uploader.as_mut() else {
            return Err(PipelineError::NoUploadTarget);
        };
        let result = uploader
            .upload(&self.artifacts, progress)
            .instrument(logger.span())
            .await;

        match result {
            Ok(outcome) => {
                self.advance(LifecycleEvent::UploadSucceeded)?;
                logger.batch_finished(outcome.items.len());
                tokio::time::sleep(self.config.reset_delay).await;
                self.advance(LifecycleEvent::DisplayElapsed)?;
                self.clear();
                Ok(outcome)
            }
            Err(e) => {
                let err = PipelineError::from(e);
                logger.failed(&err);
                self.fail(strategy == "bulk" || err.is_file_access())?;
                Err(err)
            }
        }
    }

    /// Close the run from any phase, discarding all state.
    pub fn close(&mut self) -> PipelineResult<()> {
        self.advance(LifecycleEvent::Close)?;
        self.clear();
        Ok(())
    }

    /// Start over after a reset.
    pub fn reopen(&mut self) -> PipelineResult<()> {
        self.advance(LifecycleEvent::Reopen)?;
        Ok(())
    }

    fn advance(&mut self, event: LifecycleEvent) -> PipelineResult<PipelinePhase> {
        let from = self.lifecycle.phase();
        let to = self.lifecycle.apply(event)?;
        self.logger.phase_changed(from, to);
        Ok(to)
    }

    fn fail(&mut self, reset: bool) -> PipelineResult<()> {
        self.artifacts.clear();
        if self.advance(LifecycleEvent::Failed { reset })? == PipelinePhase::Reset {
            self.clear();
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.source = None;
        self.timeline = None;
        self.artifacts.clear();
    }
}
