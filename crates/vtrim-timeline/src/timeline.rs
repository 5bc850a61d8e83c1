//! Ordered clip range collection over a fixed media duration.

use tracing::debug;
use vtrim_models::ClipRange;

use crate::boundary::{apply_boundary, Edge};
use crate::error::{TimelineError, TimelineResult};

/// The clip ranges marked on one source video.
///
/// Every stored range satisfies `0 <= start < end <= media_duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipTimeline {
    media_duration: f64,
    ranges: Vec<ClipRange>,
}

impl ClipTimeline {
    /// Create a timeline holding the single full-span range `[0, duration]`.
    pub fn initialize(media_duration: f64) -> TimelineResult<Self> {
        if !media_duration.is_finite() || media_duration <= 0.0 {
            return Err(TimelineError::InvalidMedia(media_duration));
        }

        debug!(media_duration, "Timeline initialized");
        Ok(Self {
            media_duration,
            ranges: vec![ClipRange::new(0.0, media_duration)],
        })
    }

    /// Add a range carved from the middle of the longest range.
    ///
    /// The longest range (lowest index on ties) is left unchanged; the new
    /// range `[mid - len/8, mid + len/8]` is appended. Returns its index.
    /// A range too short to yield a non-empty split is refused with
    /// `RangeTooShort`.
    pub fn add_by_split(&mut self) -> TimelineResult<usize> {
        let (longest_idx, longest) = self
            .ranges
            .iter()
            .enumerate()
            .fold(None::<(usize, ClipRange)>, |best, (i, r)| match best {
                Some((_, b)) if b.duration() >= r.duration() => best,
                _ => Some((i, *r)),
            })
            .ok_or(TimelineError::EmptyTimeline)?;

        let mid = longest.midpoint();
        let half = longest.duration() / 8.0;
        let added = ClipRange::new(mid - half, mid + half);
        if !(added.start_time < added.end_time) {
            return Err(TimelineError::RangeTooShort(longest_idx));
        }
        self.ranges.push(added);

        debug!(
            split_from = longest_idx,
            start = added.start_time,
            end = added.end_time,
            "Clip range added"
        );
        Ok(self.ranges.len() - 1)
    }

    /// Remove the range at `index`. Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) -> Option<ClipRange> {
        if index >= self.ranges.len() {
            return None;
        }
        let removed = self.ranges.remove(index);
        debug!(index, remaining = self.ranges.len(), "Clip range removed");
        Some(removed)
    }

    /// Move one edge of the range at `index`.
    ///
    /// Updates that would break `start < end` are dropped silently; the
    /// return value reports whether the range changed.
    pub fn set_boundary(&mut self, index: usize, edge: Edge, proposed_time: f64) -> bool {
        let media_duration = self.media_duration;
        let Some(range) = self.ranges.get_mut(index) else {
            return false;
        };

        match apply_boundary(*range, edge, proposed_time, media_duration) {
            Some(updated) => {
                *range = updated;
                true
            }
            None => false,
        }
    }

    /// Replace the range at `index` outright, clamped to the media.
    pub fn set_range(&mut self, index: usize, range: ClipRange) -> TimelineResult<()> {
        let len = self.ranges.len();
        let media_duration = self.media_duration;
        let current = self
            .ranges
            .get_mut(index)
            .ok_or(TimelineError::IndexOutOfRange { index, len })?;

        let start = range.start_time.clamp(0.0, media_duration);
        let end = range.end_time.clamp(0.0, media_duration);
        // Also rejects NaN.
        if !(start < end) {
            return Err(TimelineError::InvalidRange {
                start: range.start_time,
                end: range.end_time,
            });
        }

        *current = ClipRange::new(start, end);
        Ok(())
    }

    pub fn media_duration(&self) -> f64 {
        self.media_duration
    }

    pub fn ranges(&self) -> &[ClipRange] {
        &self.ranges
    }

    pub fn get(&self, index: usize) -> Option<ClipRange> {
        self.ranges.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Copy of the ranges, failing when the timeline is empty.
    pub fn snapshot(&self) -> TimelineResult<Vec<ClipRange>> {
        if self.ranges.is_empty() {
            return Err(TimelineError::EmptyTimeline);
        }
        Ok(self.ranges.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_valid(timeline: &ClipTimeline) -> bool {
        timeline
            .ranges()
            .iter()
            .all(|r| r.is_valid_within(timeline.media_duration()))
    }

    #[test]
    fn test_initialize_full_span() {
        let timeline = ClipTimeline::initialize(100.0).unwrap();
        assert_eq!(timeline.ranges(), &[ClipRange::new(0.0, 100.0)]);
    }

    #[test]
    fn test_initialize_rejects_bad_durations() {
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ClipTimeline::initialize(bad),
                Err(TimelineError::InvalidMedia(_))
            ));
        }
    }

    #[test]
    fn test_add_by_split_middle_half() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        let idx = timeline.add_by_split().unwrap();

        assert_eq!(idx, 1);
        assert_eq!(timeline.get(0), Some(ClipRange::new(0.0, 100.0)));
        assert_eq!(timeline.get(1), Some(ClipRange::new(37.5, 62.5)));
    }

    #[test]
    fn test_add_by_split_picks_longest_lowest_index_on_tie() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        timeline.set_boundary(0, Edge::End, 40.0);
        timeline.add_by_split().unwrap(); // [15, 25] from [0, 40]
        timeline.set_boundary(1, Edge::End, 55.0); // [15, 55], length 40 ties range 0

        timeline.add_by_split().unwrap();
        assert_eq!(timeline.get(2), Some(ClipRange::new(15.0, 25.0)));
    }

    #[test]
    fn test_add_by_split_refuses_sliver_range() {
        let mut timeline = ClipTimeline::initialize(10.0).unwrap();
        assert!(timeline.set_boundary(0, Edge::Start, 1.0));
        assert!(timeline.set_boundary(0, Edge::End, f64::from_bits(1.0f64.to_bits() + 1)));

        assert_eq!(timeline.add_by_split(), Err(TimelineError::RangeTooShort(0)));
        assert_eq!(timeline.len(), 1);
        assert!(all_valid(&timeline));
    }

    #[test]
    fn test_add_by_split_on_empty_timeline() {
        let mut timeline = ClipTimeline::initialize(10.0).unwrap();
        timeline.remove(0);
        assert_eq!(timeline.add_by_split(), Err(TimelineError::EmptyTimeline));
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut timeline = ClipTimeline::initialize(10.0).unwrap();
        timeline.add_by_split().unwrap();

        assert_eq!(timeline.remove(2), None);
        assert_eq!(timeline.remove(usize::MAX), None);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        timeline.add_by_split().unwrap();

        assert_eq!(timeline.remove(0), Some(ClipRange::new(0.0, 100.0)));
        assert_eq!(timeline.get(0), Some(ClipRange::new(37.5, 62.5)));
    }

    #[test]
    fn test_set_boundary_start_past_end_is_noop() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        timeline.set_boundary(0, Edge::End, 50.0);

        assert!(!timeline.set_boundary(0, Edge::Start, 50.0));
        assert!(!timeline.set_boundary(0, Edge::Start, 75.0));
        assert_eq!(timeline.get(0), Some(ClipRange::new(0.0, 50.0)));
    }

    #[test]
    fn test_set_boundary_unknown_index() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        assert!(!timeline.set_boundary(3, Edge::Start, 1.0));
    }

    #[test]
    fn test_snapshot_requires_ranges() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        assert_eq!(timeline.snapshot().unwrap().len(), 1);
        timeline.remove(0);
        assert_eq!(timeline.snapshot(), Err(TimelineError::EmptyTimeline));
    }

    #[test]
    fn test_invariant_holds_over_mixed_edits() {
        let mut timeline = ClipTimeline::initialize(60.0).unwrap();
        let proposals = [-10.0, 0.0, 3.3, 17.9, 30.0, 59.99, 60.0, 75.0, f64::NAN];

        for step in 0..200usize {
            match step % 7 {
                0 | 3 => {
                    let _ = timeline.add_by_split();
                }
                5 if timeline.len() > 1 => {
                    timeline.remove(step % timeline.len());
                }
                _ => {
                    if !timeline.is_empty() {
                        let idx = step % timeline.len();
                        let edge = if step % 2 == 0 { Edge::Start } else { Edge::End };
                        timeline.set_boundary(idx, edge, proposals[step % proposals.len()]);
                    }
                }
            }
            assert!(all_valid(&timeline), "invariant broken at step {}", step);
        }
    }

    #[test]
    fn test_set_range_replaces_and_clamps() {
        let mut timeline = ClipTimeline::initialize(100.0).unwrap();
        timeline.set_range(0, ClipRange::new(90.0, 120.0)).unwrap();
        assert_eq!(timeline.get(0), Some(ClipRange::new(90.0, 100.0)));

        assert_eq!(
            timeline.set_range(0, ClipRange::new(50.0, 40.0)),
            Err(TimelineError::InvalidRange { start: 50.0, end: 40.0 })
        );
        assert_eq!(
            timeline.set_range(3, ClipRange::new(1.0, 2.0)),
            Err(TimelineError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(timeline.get(0), Some(ClipRange::new(90.0, 100.0)));
    }
}
