//! Timeline error types.

use thiserror::Error;

pub type TimelineResult<T> = Result<T, TimelineError>;

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("Invalid media duration: {0}")]
    InvalidMedia(f64),

    #[error("Timeline has no clip ranges")]
    EmptyTimeline,

    #[error("Clip index {index} out of range (timeline has {len} clips)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Clip {0} is too short to split")]
    RangeTooShort(usize),

    #[error("Invalid clip range {start}-{end}")]
    InvalidRange { start: f64, end: f64 },
}
