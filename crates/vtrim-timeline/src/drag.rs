//! Pointer drag to boundary update adapter.
//!
//! The controller owns only transient interaction state: the drag in
//! progress and any running preview. Clip ranges always live in the
//! [`ClipTimeline`].

use tracing::debug;

use crate::boundary::Edge;
use crate::preview::{BoundaryPreview, PreviewPlayer, PreviewStatus};
use crate::timeline::ClipTimeline;

/// Map a pixel offset on a fixed-width track to a media time.
///
/// A non-positive track width maps everything to zero.
pub fn offset_to_time(offset_x: f64, track_width: f64, media_duration: f64) -> f64 {
    if track_width <= 0.0 {
        return 0.0;
    }
    (offset_x / track_width) * media_duration
}

/// One pointer interaction on a clip edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub index: usize,
    pub edge: Edge,
    pub track_width: f64,
}

/// Converts pointer drags into timeline boundary updates.
#[derive(Debug, Default)]
pub struct BoundaryDragController {
    session: Option<DragSession>,
    preview: Option<BoundaryPreview>,
}

impl BoundaryDragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging `edge` of the clip at `index`.
    ///
    /// A running preview is cancelled first.
    pub fn begin<P: PreviewPlayer + ?Sized>(
        &mut self,
        index: usize,
        edge: Edge,
        track_width: f64,
        player: &mut P,
    ) {
        if let Some(preview) = self.preview.take() {
            preview.cancel(player);
        }
        debug!(index, %edge, "Drag started");
        self.session = Some(DragSession {
            index,
            edge,
            track_width,
        });
    }

    /// Apply a pointer move. Returns whether the timeline changed.
    ///
    /// Moves outside a drag, and moves that would invert the range, are
    /// ignored.
    pub fn move_to(&mut self, offset_x: f64, timeline: &mut ClipTimeline) -> bool {
        let Some(session) = self.session else {
            return false;
        };
        let proposed = offset_to_time(offset_x, session.track_width, timeline.media_duration());
        timeline.set_boundary(session.index, session.edge, proposed)
    }

    /// End the drag and forget its state.
    pub fn release(&mut self) -> Option<DragSession> {
        let session = self.session.take();
        if let Some(s) = &session {
            debug!(index = s.index, edge = %s.edge, "Drag released");
        }
        session
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Preview the clip at `index` from its start edge.
    ///
    /// Returns `false` when the index does not exist.
    pub fn start_preview<P: PreviewPlayer + ?Sized>(
        &mut self,
        index: usize,
        timeline: &ClipTimeline,
        player: &mut P,
    ) -> bool {
        let Some(range) = timeline.get(index) else {
            return false;
        };
        if let Some(previous) = self.preview.take() {
            previous.cancel(player);
        }
        self.preview = Some(BoundaryPreview::start(index, range, player));
        true
    }

    /// Feed a playhead position to the running preview, if any.
    pub fn on_time_update<P: PreviewPlayer + ?Sized>(
        &mut self,
        position: f64,
        timeline: &ClipTimeline,
        player: &mut P,
    ) -> Option<PreviewStatus> {
        let preview = self.preview.as_ref()?;
        let status = preview.on_time_update(position, timeline.get(preview.index()), player);
        if status != PreviewStatus::Playing {
            self.preview = None;
        }
        Some(status)
    }

    pub fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::tests::RecordingPlayer;
    use vtrim_models::ClipRange;

    #[test]
    fn test_offset_to_time() {
        assert_eq!(offset_to_time(250.0, 1000.0, 120.0), 30.0);
        assert_eq!(offset_to_time(10.0, 0.0, 120.0), 0.0);
    }

    #[test]
    fn test_drag_updates_boundary() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        let mut player = RecordingPlayer::default();
        let mut controller = BoundaryDragController::new();

        controller.begin(0, Edge::Start, 500.0, &mut player);
        assert!(controller.is_dragging());
        assert!(controller.move_to(100.0, &mut timeline));
        assert_eq!(timeline.get(0), Some(ClipRange::new(20.0, 100.0)));

        // Past the end edge: ignored.
        assert!(!controller.move_to(500.0, &mut timeline));
        assert_eq!(timeline.get(0), Some(ClipRange::new(20.0, 100.0)));

        // Dragged off the left of the track: clamped to zero.
        assert!(controller.move_to(-40.0, &mut timeline));
        assert_eq!(timeline.get(0), Some(ClipRange::new(0.0, 100.0)));

        controller.release();
        assert!(!controller.is_dragging());
        assert!(!controller.move_to(250.0, &mut timeline));
    }

    #[test]
    fn test_new_drag_cancels_preview() {
        let timeline = ClipTimeline::initialize(100.0).unwrap();
        let mut player = RecordingPlayer::default();
        let mut controller = BoundaryDragController::new();

        assert!(controller.start_preview(0, &timeline, &mut player));
        assert!(controller.is_previewing());

        controller.begin(0, Edge::End, 500.0, &mut player);
        assert!(!controller.is_previewing());
        assert_eq!(player.calls, vec!["seek:0", "play", "pause"]);
    }

    #[test]
    fn test_preview_detaches_after_end_drag() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        let mut player = RecordingPlayer::default();
        let mut controller = BoundaryDragController::new();

        controller.start_preview(0, &timeline, &mut player);
        timeline.set_boundary(0, Edge::End, 80.0);

        assert_eq!(
            controller.on_time_update(10.0, &timeline, &mut player),
            Some(PreviewStatus::Detached)
        );
        assert_eq!(controller.on_time_update(11.0, &timeline, &mut player), None);
    }

    #[test]
    fn test_preview_finishes_at_end() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        timeline.add_by_split().unwrap();
        let mut player = RecordingPlayer::default();
        let mut controller = BoundaryDragController::new();

        controller.start_preview(1, &timeline, &mut player);
        assert_eq!(
            controller.on_time_update(50.0, &timeline, &mut player),
            Some(PreviewStatus::Playing)
        );
        assert_eq!(
            controller.on_time_update(62.5, &timeline, &mut player),
            Some(PreviewStatus::Finished)
        );
        assert!(!controller.is_previewing());
    }
}
