//! Phase machine for one pipeline run.
//!
//! ```text
//! AwaitingUpload --media validated--> EditingTimeline --trim--> Transcoding
//! Transcoding --success--> ReviewingResults --submit--> Uploading
//! Uploading --success--> Completed --display elapsed--> Reset
//! Transcoding/Uploading --failure--> EditingTimeline (or Reset)
//! any --close--> Reset
//! ```

use vtrim_models::PipelinePhase;

use crate::error::{PipelineError, PipelineResult};

/// Triggers that move the pipeline between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    MediaValidated,
    TrimRequested,
    TranscodeSucceeded,
    /// Leave the results view to change the clips.
    EditRequested,
    SubmitRequested,
    UploadSucceeded,
    DisplayElapsed,
    /// Unrecoverable failure while transcoding or uploading.
    Failed { reset: bool },
    Close,
    Reopen,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::MediaValidated => "load a video",
            LifecycleEvent::TrimRequested => "trim clips",
            LifecycleEvent::TranscodeSucceeded => "finish trimming",
            LifecycleEvent::EditRequested => "edit clips",
            LifecycleEvent::SubmitRequested => "upload clips",
            LifecycleEvent::UploadSucceeded => "finish uploading",
            LifecycleEvent::DisplayElapsed => "reset",
            LifecycleEvent::Failed { .. } => "recover from failure",
            LifecycleEvent::Close => "close",
            LifecycleEvent::Reopen => "reopen",
        }
    }
}

/// Phase of a pipeline run plus the phases it has been through.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: PipelinePhase,
    history: Vec<PipelinePhase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: PipelinePhase::AwaitingUpload,
            history: vec![PipelinePhase::AwaitingUpload],
        }
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Every phase entered so far, oldest first.
    pub fn history(&self) -> &[PipelinePhase] {
        &self.history
    }

    /// Phase `event` would lead to, without applying it.
    pub fn next(&self, event: LifecycleEvent) -> PipelineResult<PipelinePhase> {
        use LifecycleEvent as E;
        use PipelinePhase as P;

        let next = match (self.phase, event) {
            (_, E::Close) => P::Reset,
            (P::AwaitingUpload | P::Reset, E::MediaValidated) => P::EditingTimeline,
            (P::Reset, E::Reopen) => P::AwaitingUpload,
            (P::EditingTimeline, E::TrimRequested) => P::Transcoding,
            (P::Transcoding, E::TranscodeSucceeded) => P::ReviewingResults,
            (P::ReviewingResults, E::EditRequested) => P::EditingTimeline,
            (P::ReviewingResults, E::SubmitRequested) => P::Uploading,
            (P::Uploading, E::UploadSucceeded) => P::Completed,
            (P::Completed, E::DisplayElapsed) => P::Reset,
            (P::Transcoding | P::Uploading, E::Failed { reset: true }) => P::Reset,
            (P::Transcoding | P::Uploading, E::Failed { reset: false }) => P::EditingTimeline,
            (from, event) => {
                return Err(PipelineError::InvalidTransition {
                    from,
                    event: event.as_str(),
                })
            }
        };
        Ok(next)
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: LifecycleEvent) -> PipelineResult<PipelinePhase> {
        let next = self.next(event)?;
        self.phase = next;
        self.history.push(next);
        Ok(next)
    }

    /// Fail with `InvalidTransition` unless `event` is legal now.
    pub fn ensure(&self, event: LifecycleEvent) -> PipelineResult<()> {
        self.next(event).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleEvent as E;
    use PipelinePhase as P;

    #[test]
    fn test_happy_path() {
        let mut lifecycle = Lifecycle::new();
        for event in [
            E::MediaValidated,
            E::TrimRequested,
            E::TranscodeSucceeded,
            E::SubmitRequested,
            E::UploadSucceeded,
            E::DisplayElapsed,
        ] {
            lifecycle.apply(event).unwrap();
        }
        assert_eq!(
            lifecycle.history(),
            &[
                P::AwaitingUpload,
                P::EditingTimeline,
                P::Transcoding,
                P::ReviewingResults,
                P::Uploading,
                P::Completed,
                P::Reset,
            ]
        );
    }

    #[test]
    fn test_failures_return_to_editing_or_reset() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.apply(E::MediaValidated).unwrap();
        lifecycle.apply(E::TrimRequested).unwrap();
        assert_eq!(lifecycle.apply(E::Failed { reset: false }).unwrap(), P::EditingTimeline);

        lifecycle.apply(E::TrimRequested).unwrap();
        assert_eq!(lifecycle.apply(E::Failed { reset: true }).unwrap(), P::Reset);
    }

    #[test]
    fn test_close_from_any_phase() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.apply(E::MediaValidated).unwrap();
        lifecycle.apply(E::TrimRequested).unwrap();
        assert_eq!(lifecycle.apply(E::Close).unwrap(), P::Reset);
        assert_eq!(lifecycle.apply(E::Reopen).unwrap(), P::AwaitingUpload);
    }

    #[test]
    fn test_illegal_transitions_are_rejected() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.apply(E::TrimRequested).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition {
                from: P::AwaitingUpload,
                ..
            }
        ));
        assert_eq!(lifecycle.phase(), P::AwaitingUpload);
        assert_eq!(lifecycle.history().len(), 1);

        lifecycle.apply(E::MediaValidated).unwrap();
        assert!(lifecycle.ensure(E::SubmitRequested).is_err());
        assert!(lifecycle.ensure(E::Failed { reset: false }).is_err());
    }
}
