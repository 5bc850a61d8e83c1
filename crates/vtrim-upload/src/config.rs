//! Upload configuration.

use std::time::Duration;

use vtrim_models::UploadTarget;

use crate::error::{UploadError, UploadResult};

/// Upload target plus the headers sent with every request.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub target: UploadTarget,
    /// Extra headers applied to every request
    pub headers: Vec<(String, String)>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl UploadConfig {
    pub fn new(target: UploadTarget) -> Self {
        Self {
            target,
            headers: Vec::new(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bearer(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.with_header("Authorization", value)
    }

    /// Create config from environment variables.
    ///
    /// `VTRIM_BULK_ENDPOINT` selects the bulk strategy; otherwise both
    /// `VTRIM_MEDIA_ENDPOINT` and `VTRIM_RECORD_ENDPOINT` must be set.
    pub fn from_env() -> UploadResult<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let target = match var("VTRIM_BULK_ENDPOINT") {
            Some(endpoint) => UploadTarget::bulk(endpoint),
            None => {
                let media = var("VTRIM_MEDIA_ENDPOINT");
                let record = var("VTRIM_RECORD_ENDPOINT");
                match (media, record) {
                    (Some(media), Some(record)) => {
                        UploadTarget::two_phase(media, record, var("VTRIM_PARENT_ID"))
                    }
                    _ => {
                        return Err(UploadError::config(
                            "set VTRIM_BULK_ENDPOINT, or both VTRIM_MEDIA_ENDPOINT and VTRIM_RECORD_ENDPOINT",
                        ))
                    }
                }
            }
        };

        let mut config = Self::new(target);
        if let Some(secs) = var("VTRIM_UPLOAD_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(token) = var("VTRIM_AUTH_TOKEN") {
            config = config.with_bearer(token);
        }
        if let Some(raw) = var("VTRIM_HEADERS") {
            config.headers.extend(parse_headers(&raw)?);
        }
        Ok(config)
    }
}

/// Parse `name=value;name=value` header lists.
pub fn parse_headers(raw: &str) -> UploadResult<Vec<(String, String)>> {
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| UploadError::InvalidHeader(pair.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(UploadError::InvalidHeader(pair.to_string()));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
