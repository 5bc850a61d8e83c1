//! Clip timeline editing.
//!
//! This crate provides:
//! - The ordered clip range collection over a fixed media duration
//! - The boundary update rule shared by every edit path
//! - A pointer-drag adapter and a bounded preview playback loop

pub mod boundary;
pub mod drag;
pub mod error;
pub mod preview;
pub mod timeline;

pub use boundary::{apply_boundary, Edge};
pub use drag::{BoundaryDragController, DragSession};
pub use error::{TimelineError, TimelineResult};
pub use preview::{BoundaryPreview, PreviewPlayer, PreviewStatus};
pub use timeline::ClipTimeline;
