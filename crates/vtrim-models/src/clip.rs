//! Clip ranges and trimmed output artifacts.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::timestamp::format_duration_label;

/// A `[start, end]` sub-interval of the source media, in seconds.
///
/// Identity is positional: a range is addressed by its index in the
/// timeline, and that order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRange {
    pub start_time: f64,
    pub end_time: f64,
}

impl ClipRange {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Length of the range in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Midpoint of the range in seconds.
    pub fn midpoint(&self) -> f64 {
        (self.start_time + self.end_time) / 2.0
    }

    /// Whole-second bounds handed to the transcoder.
    ///
    /// Sub-second precision is discarded here, so a range can become
    /// zero-length after truncation.
    pub fn truncated(&self) -> (u64, u64) {
        (self.start_time.trunc() as u64, self.end_time.trunc() as u64)
    }

    /// Check `0 <= start < end <= media_duration`.
    pub fn is_valid_within(&self, media_duration: f64) -> bool {
        self.start_time >= 0.0 && self.start_time < self.end_time && self.end_time <= media_duration
    }
}

/// Naming scheme for default artifact labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SiteMode {
    /// Artifacts are named `video1`, `video2`, ...
    #[default]
    Video,
    /// Artifacts are named `lesson1`, `lesson2`, ...
    Lesson,
}

impl SiteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteMode::Video => "video",
            SiteMode::Lesson => "lesson",
        }
    }

    /// Default label for the clip at zero-based `index`.
    pub fn default_name(&self, index: usize) -> String {
        format!("{}{}", self.as_str(), index + 1)
    }

    /// Parse a site mode, defaulting to `Video` for anything unrecognised.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "lesson" | "lessons" => SiteMode::Lesson,
            _ => SiteMode::Video,
        }
    }
}

impl std::fmt::Display for SiteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One transcoded output file, produced from exactly one clip range.
#[derive(Debug, Clone)]
pub struct TrimmedArtifact {
    /// Default label (`video{n}` / `lesson{n}`)
    pub name: String,
    /// Index of the clip range this artifact was cut from
    pub source_range_index: usize,
    /// Measured duration of the output in seconds
    pub duration_seconds: f64,
    /// MIME type, inherited from the source media
    pub mime_type: String,
    /// Output bytes
    pub data: Bytes,
    /// User-facing name used at upload time
    pub editable_name: String,
}

impl TrimmedArtifact {
    pub fn new(
        name: impl Into<String>,
        source_range_index: usize,
        duration_seconds: f64,
        mime_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        let name = name.into();
        Self {
            editable_name: name.clone(),
            name,
            source_range_index,
            duration_seconds,
            mime_type: mime_type.into(),
            data,
        }
    }

    /// File extension derived from the MIME subtype (`video/webm` -> `webm`).
    pub fn extension(&self) -> &str {
        self.mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype.split(';').next().unwrap_or(subtype).trim())
            .filter(|s| !s.is_empty())
            .unwrap_or("bin")
    }

    /// File name used in upload payloads and on disk.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.display_name(), self.extension())
    }

    /// The editable name, falling back to the default label when blank.
    pub fn display_name(&self) -> &str {
        let trimmed = self.editable_name.trim();
        if trimmed.is_empty() {
            &self.name
        } else {
            trimmed
        }
    }

    /// Set the user-facing name. Blank input reverts to the default label.
    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.editable_name = if name.trim().is_empty() {
            self.name.clone()
        } else {
            name.trim().to_string()
        };
    }

    /// Duration as `MM:SS` (or `HH:MM:SS` past an hour).
    pub fn duration_label(&self) -> String {
        format_duration_label(self.duration_seconds)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}
