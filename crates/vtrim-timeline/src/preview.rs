//! Bounded clip preview playback.
//!
//! A preview seeks to a clip's start, plays until the playhead reaches the
//! clip's end, then pauses and rewinds to the start. The watch is keyed to
//! the end time captured when the preview began and detaches as soon as
//! that end time changes.

use tracing::debug;
use vtrim_models::ClipRange;

/// Playback surface driven by a preview.
pub trait PreviewPlayer {
    fn seek(&mut self, time: f64);
    fn play(&mut self);
    fn pause(&mut self);
}

/// Outcome of feeding a playhead position to a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStatus {
    /// Still inside the clip
    Playing,
    /// Reached the end; paused and rewound
    Finished,
    /// The watched range changed or vanished; the watch was dropped
    Detached,
}

/// One active preview of the clip at `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPreview {
    index: usize,
    start: f64,
    end: f64,
}

impl BoundaryPreview {
    /// Seek to the clip start and begin playback.
    pub fn start<P: PreviewPlayer + ?Sized>(
        index: usize,
        range: ClipRange,
        player: &mut P,
    ) -> Self {
        player.seek(range.start_time);
        player.play();
        debug!(index, start = range.start_time, end = range.end_time, "Preview started");
        Self {
            index,
            start: range.start_time,
            end: range.end_time,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Feed the current playhead position.
    ///
    /// `current` is the range now stored at this preview's index.
    pub fn on_time_update<P: PreviewPlayer + ?Sized>(
        &self,
        position: f64,
        current: Option<ClipRange>,
        player: &mut P,
    ) -> PreviewStatus {
        match current {
            Some(range) if range.end_time == self.end => {}
            _ => {
                debug!(index = self.index, "Preview detached: range changed");
                return PreviewStatus::Detached;
            }
        }

        if position >= self.end {
            player.pause();
            player.seek(self.start);
            PreviewStatus::Finished
        } else {
            PreviewStatus::Playing
        }
    }

    /// Stop the preview where it is.
    pub fn cancel<P: PreviewPlayer + ?Sized>(self, player: &mut P) {
        debug!(index = self.index, "Preview cancelled");
        player.pause();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Player that records every call.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingPlayer {
        pub calls: Vec<String>,
    }

    impl PreviewPlayer for RecordingPlayer {
        fn seek(&mut self, time: f64) {
            self.calls.push(format!("seek:{}", time));
        }
        fn play(&mut self) {
            self.calls.push("play".to_string());
        }
        fn pause(&mut self) {
            self.calls.push("pause".to_string());
        }
    }

    #[test]
    fn test_preview_plays_to_end_then_rewinds() {
        let mut player = RecordingPlayer::default();
        let range = ClipRange::new(5.0, 8.0);
        let preview = BoundaryPreview::start(0, range, &mut player);

        assert_eq!(
            preview.on_time_update(6.0, Some(range), &mut player),
            PreviewStatus::Playing
        );
        assert_eq!(
            preview.on_time_update(8.1, Some(range), &mut player),
            PreviewStatus::Finished
        );
        assert_eq!(player.calls, vec!["seek:5", "play", "pause", "seek:5"]);
    }

    #[test]
    fn test_preview_detaches_when_end_changes() {
        let mut player = RecordingPlayer::default();
        let preview = BoundaryPreview::start(1, ClipRange::new(5.0, 8.0), &mut player);

        let moved = ClipRange::new(5.0, 9.0);
        assert_eq!(
            preview.on_time_update(8.5, Some(moved), &mut player),
            PreviewStatus::Detached
        );
        assert_eq!(
            preview.on_time_update(8.5, None, &mut player),
            PreviewStatus::Detached
        );
        // No pause or rewind once detached.
        assert_eq!(player.calls, vec!["seek:5", "play"]);
    }

    #[test]
    fn test_preview_survives_start_change() {
        let mut player = RecordingPlayer::default();
        let preview = BoundaryPreview::start(0, ClipRange::new(5.0, 8.0), &mut player);

        let moved_start = ClipRange::new(6.0, 8.0);
        assert_eq!(
            preview.on_time_update(7.0, Some(moved_start), &mut player),
            PreviewStatus::Playing
        );
    }
}
