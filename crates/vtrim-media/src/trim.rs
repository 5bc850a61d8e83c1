//! Trim planning.
//!
//! Ranges are truncated to whole seconds before they reach the transcoder,
//! and the whole batch is rejected if any range collapses to zero length.

use vtrim_models::{ClipRange, MediaFormat};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Whole-second cut for one clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPlan {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl TrimPlan {
    pub fn duration(&self) -> u64 {
        self.end - self.start
    }

    /// Working-namespace name for this clip's copy of the source.
    pub fn input_name(&self, format: MediaFormat) -> String {
        format!("clip{}_input.{}", self.index, format.extension())
    }

    /// Working-namespace name for this clip's output.
    pub fn output_name(&self, format: MediaFormat) -> String {
        format!("clip{}_output.{}", self.index, format.extension())
    }

    /// Build the stream-copy trim command for the source format.
    ///
    /// MP4 is cut between input seek points with timestamps shifted to
    /// zero; WebM seeks the input and bounds the output by duration.
    pub fn command(&self, format: MediaFormat) -> FfmpegCommand {
        let cmd = FfmpegCommand::new(self.input_name(format), self.output_name(format));
        match format {
            MediaFormat::Mp4 => cmd
                .seek(self.start)
                .read_until(self.end)
                .codec_copy()
                .avoid_negative_ts(),
            MediaFormat::Webm => cmd.seek(self.start).duration(self.duration()).codec_copy(),
        }
    }
}

/// Truncate every range and validate the batch.
///
/// Fails with `InvalidClip(i)` on the first range whose truncated start is
/// not before its truncated end.
pub fn plan_trims(ranges: &[ClipRange]) -> MediaResult<Vec<TrimPlan>> {
    ranges
        .iter()
        .enumerate()
        .map(|(index, range)| {
            let (start, end) = range.truncated();
            if start >= end {
                return Err(MediaError::InvalidClip(index));
            }
            Ok(TrimPlan { index, start, end })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_truncates_to_whole_seconds() {
        let plans = plan_trims(&[ClipRange::new(2.7, 5.9), ClipRange::new(2.9, 3.1)]).unwrap();
        assert_eq!(plans[0], TrimPlan { index: 0, start: 2, end: 5 });
        assert_eq!(plans[1], TrimPlan { index: 1, start: 2, end: 3 });
    }

    #[test]
    fn test_plan_rejects_zero_length_after_truncation() {
        let err = plan_trims(&[ClipRange::new(0.0, 10.0), ClipRange::new(2.9, 2.95)]).unwrap_err();
        assert!(matches!(err, MediaError::InvalidClip(1)));
    }

    #[test]
    fn test_mp4_command_uses_seek_window() {
        let plan = TrimPlan { index: 0, start: 2, end: 5 };
        let args = plan.command(MediaFormat::Mp4).build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-ss 2 -to 5 -i clip0_input.mp4"));
        assert!(joined.contains("-c copy -avoid_negative_ts make_zero clip0_output.mp4"));
    }

    #[test]
    fn test_webm_command_uses_duration() {
        let plan = TrimPlan { index: 3, start: 2, end: 5 };
        let args = plan.command(MediaFormat::Webm).build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-ss 2 -i clip3_input.webm -t 3 -c copy clip3_output.webm"));
        assert!(!joined.contains("-to"));
    }
}
