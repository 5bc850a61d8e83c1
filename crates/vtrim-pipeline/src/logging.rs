//! Structured run logging.
//!
//! Every event carries `run_id` and `stage` fields; counts, phases and clip
//! indices are recorded as fields rather than formatted into the message.

use std::path::Path;

use tracing::{debug, error, info, Span};
use vtrim_models::{PipelinePhase, ProgressSink, ProgressUpdate, RunId, SourceMedia};

use crate::error::PipelineError;

/// Event logger for one run, scoped to the stage doing the work.
#[derive(Debug, Clone, Copy)]
pub struct RunLogger {
    run_id: RunId,
    stage: &'static str,
}

impl RunLogger {
    pub fn new(run_id: RunId, stage: &'static str) -> Self {
        Self { run_id, stage }
    }

    /// Same run, different stage.
    pub fn stage(&self, stage: &'static str) -> Self {
        Self::new(self.run_id, stage)
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage
    }

    pub fn phase_changed(&self, from: PipelinePhase, to: PipelinePhase) {
        info!(run_id = %self.run_id, stage = self.stage, %from, %to, "Phase changed");
    }

    pub fn source_loaded(&self, source: &SourceMedia, media_duration: f64) {
        info!(
            run_id = %self.run_id,
            stage = self.stage,
            source = %source.name,
            format = %source.format,
            bytes = source.size(),
            media_duration,
            "Source loaded"
        );
    }

    pub fn batch_started(&self, items: usize) {
        info!(run_id = %self.run_id, stage = self.stage, items, "Batch started");
    }

    pub fn batch_finished(&self, items: usize) {
        info!(run_id = %self.run_id, stage = self.stage, items, "Batch finished");
    }

    pub fn artifacts_saved(&self, items: usize, dir: &Path) {
        info!(
            run_id = %self.run_id,
            stage = self.stage,
            items,
            dir = %dir.display(),
            "Clips saved"
        );
    }

    /// A failed stage, with the clip it stopped at when known.
    pub fn failed(&self, err: &PipelineError) {
        error!(
            run_id = %self.run_id,
            stage = self.stage,
            clip = err.clip_index().map(|i| i + 1),
            file_access = err.is_file_access(),
            "{}",
            err
        );
    }

    pub fn span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, stage = self.stage)
    }
}

impl ProgressSink for RunLogger {
    fn report(&self, update: ProgressUpdate) {
        if update.is_complete() {
            info!(
                run_id = %self.run_id,
                stage = self.stage,
                total = update.total,
                "All items done"
            );
        } else {
            debug!(
                run_id = %self.run_id,
                stage = self.stage,
                completed = update.completed,
                total = update.total,
                percent = update.percent,
                "Progress"
            );
        }
    }
}
