//! Source media and supported container formats.

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Largest source file accepted (1 GiB).
pub const MAX_SOURCE_BYTES: u64 = 1024 * 1024 * 1024;

/// Supported source container families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFormat {
    /// ISO-BMFF containers (`video/mp4`)
    Mp4,
    /// Matroska-derived WebM (`video/webm`)
    Webm,
}

impl MediaFormat {
    /// Resolve a MIME type, ignoring any parameters (`; codecs=...`).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "video/mp4" => Some(MediaFormat::Mp4),
            "video/webm" => Some(MediaFormat::Webm),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => Some(MediaFormat::Mp4),
            "webm" => Some(MediaFormat::Webm),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaFormat::Mp4 => "video/mp4",
            MediaFormat::Webm => "video/webm",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Mp4 => "mp4",
            MediaFormat::Webm => "webm",
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

/// A validated source video held in memory.
#[derive(Debug, Clone)]
pub struct SourceMedia {
    pub name: String,
    pub format: MediaFormat,
    pub data: Bytes,
}

impl SourceMedia {
    /// Validate format and size, then wrap the bytes.
    pub fn new(name: impl Into<String>, mime_type: &str, data: Bytes) -> ModelResult<Self> {
        let format = MediaFormat::from_mime(mime_type)
            .ok_or_else(|| ModelError::unsupported_format(mime_type))?;
        check_size(data.len() as u64)?;

        Ok(Self {
            name: name.into(),
            format,
            data,
        })
    }

    /// Load a source file from disk.
    ///
    /// The format is inferred from the extension and the size is checked
    /// against file metadata before any bytes are read.
    pub async fn from_path(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = MediaFormat::from_extension(ext)
            .ok_or_else(|| ModelError::unsupported_format(format!("extension '{}'", ext)))?;

        let metadata = tokio::fs::metadata(path).await?;
        check_size(metadata.len())?;

        let data = tokio::fs::read(path).await?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "source".to_string());

        Ok(Self {
            name,
            format,
            data: Bytes::from(data),
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

fn check_size(size: u64) -> ModelResult<()> {
    if size > MAX_SOURCE_BYTES {
        return Err(ModelError::FileTooLarge {
            size,
            max: MAX_SOURCE_BYTES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_mime() {
        assert_eq!(MediaFormat::from_mime("video/mp4"), Some(MediaFormat::Mp4));
        assert_eq!(
            MediaFormat::from_mime("video/webm;codecs=vp8"),
            Some(MediaFormat::Webm)
        );
        assert_eq!(MediaFormat::from_mime("video/quicktime"), None);
    }

    #[test]
    fn test_source_rejects_unsupported_format() {
        let err = SourceMedia::new("clip", "image/png", Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_size_limit() {
        assert!(check_size(MAX_SOURCE_BYTES).is_ok());
        assert!(matches!(
            check_size(MAX_SOURCE_BYTES + 1),
            Err(ModelError::FileTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holiday.webm");
        tokio::fs::write(&path, b"webm-bytes").await.unwrap();

        let source = SourceMedia::from_path(&path).await.unwrap();
        assert_eq!(source.name, "holiday");
        assert_eq!(source.format, MediaFormat::Webm);
        assert_eq!(source.size(), 10);
    }

    #[tokio::test]
    async fn test_from_path_missing_file_is_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceMedia::from_path(dir.path().join("missing.mp4"))
            .await
            .unwrap_err();
        assert!(err.is_file_access());
    }
}
