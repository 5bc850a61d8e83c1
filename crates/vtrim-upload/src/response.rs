//! Wire types for the two-phase backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vtrim_models::DurationClassification;

/// Rendered title wrapper, `{"rendered": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderedTitle {
    #[serde(default)]
    pub rendered: String,
}

/// Media-creation response. Only the identifier and title are used.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub title: RenderedTitle,
}

impl MediaResponse {
    /// Identifier as a string; backends send either numbers or strings.
    pub fn id(&self) -> Option<String> {
        value_id(&self.id)
    }

    pub fn title(&self) -> Option<&str> {
        let title = self.title.rendered.trim();
        (!title.is_empty()).then_some(title)
    }
}

/// Record-creation response.
pub type RecordResponse = MediaResponse;

/// Record-creation request body.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRequest {
    pub title: String,
    pub status: &'static str,
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub media_ref: String,
    pub duration_classification: DurationClassification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<String>,
}

impl RecordRequest {
    pub fn publish(title: impl Into<String>, meta: RecordMeta) -> Self {
        Self {
            title: title.into(),
            status: "publish",
            meta,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BackendMessage {
    message: Option<String>,
}

/// `message` field of a backend error body, if there is a usable one.
pub fn backend_message(body: &str) -> Option<String> {
    serde_json::from_str::<BackendMessage>(body)
        .ok()?
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

fn value_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
