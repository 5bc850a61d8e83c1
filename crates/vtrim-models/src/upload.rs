//! Upload target shapes.

use serde::{Deserialize, Serialize};

/// Where trimmed artifacts are sent. The shape selects the strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UploadTarget {
    /// One multipart POST carrying every artifact.
    Bulk { endpoint: String },
    /// Per artifact: a media-creation POST, then a record-creation POST.
    TwoPhase {
        media_endpoint: String,
        record_endpoint: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
    },
}

impl UploadTarget {
    pub fn bulk(endpoint: impl Into<String>) -> Self {
        Self::Bulk {
            endpoint: endpoint.into(),
        }
    }

    pub fn two_phase(
        media_endpoint: impl Into<String>,
        record_endpoint: impl Into<String>,
        parent_id: Option<String>,
    ) -> Self {
        Self::TwoPhase {
            media_endpoint: media_endpoint.into(),
            record_endpoint: record_endpoint.into(),
            parent_id,
        }
    }

    /// Strategy label used in logs and metrics.
    pub fn strategy(&self) -> &'static str {
        match self {
            UploadTarget::Bulk { .. } => "bulk",
            UploadTarget::TwoPhase { .. } => "two_phase",
        }
    }
}
