//! Boundary update rule.
//!
//! Every edit to a clip edge goes through [`apply_boundary`], whether it
//! comes from a pointer drag or a direct call on the timeline.

use vtrim_models::ClipRange;

/// Which edge of a clip range is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Start,
    End,
}

impl Edge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Edge::Start => "start",
            Edge::End => "end",
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compute the range that results from moving `edge` to `proposed`.
///
/// The proposal is clamped to `[0, media_duration]`. Returns `None` when
/// the move would make `start >= end`, or when the proposal is NaN.
pub fn apply_boundary(
    range: ClipRange,
    edge: Edge,
    proposed: f64,
    media_duration: f64,
) -> Option<ClipRange> {
    if proposed.is_nan() {
        return None;
    }
    let time = proposed.clamp(0.0, media_duration);

    match edge {
        Edge::Start if time < range.end_time => Some(ClipRange::new(time, range.end_time)),
        Edge::End if time > range.start_time => Some(ClipRange::new(range.start_time, time)),
        _ => None,
    }
}
