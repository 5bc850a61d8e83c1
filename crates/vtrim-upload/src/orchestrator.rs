//! Upload orchestration.
//!
//! Bulk uploads are one atomic request. Two-phase uploads run strictly in
//! order, one clip at a time, and stop at the first failure without undoing
//! clips that were already committed.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, Instrument};
use vtrim_models::{classify_duration, ProgressSink, ProgressUpdate, TrimmedArtifact, UploadTarget};

use crate::config::UploadConfig;
use crate::error::{UploadError, UploadResult};
use crate::response::{backend_message, MediaResponse, RecordMeta, RecordRequest, RecordResponse};

/// One clip the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedItem {
    pub index: usize,
    /// File name sent to the backend
    pub file_name: String,
    /// Media identifier (two-phase only)
    pub media_id: Option<String>,
    /// Record identifier (two-phase only)
    pub record_id: Option<String>,
    pub title: String,
}

/// Summary of a successful upload batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub strategy: &'static str,
    pub items: Vec<UploadedItem>,
    pub total: usize,
}

/// Drives one of the upload strategies against a fixed target.
pub struct UploadOrchestrator {
    http: Client,
    config: UploadConfig,
    progress: ProgressUpdate,
    committed: Vec<UploadedItem>,
    outcome: Option<UploadOutcome>,
    records_ready: broadcast::Sender<()>,
}

impl UploadOrchestrator {
    /// Create an orchestrator. Configured headers go on every request.
    pub fn new(config: UploadConfig) -> UploadResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| UploadError::InvalidHeader(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| UploadError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!("vtrim-upload/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (records_ready, _) = broadcast::channel(4);

        Ok(Self {
            http,
            config,
            progress: ProgressUpdate::start(0),
            committed: Vec::new(),
            outcome: None,
            records_ready,
        })
    }

    pub fn target(&self) -> &UploadTarget {
        &self.config.target
    }

    pub fn strategy(&self) -> &'static str {
        self.config.target.strategy()
    }

    /// Subscribe to the payload-free "records ready" signal, sent once per
    /// successful batch.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.records_ready.subscribe()
    }

    /// Progress of the current or last batch.
    pub fn progress(&self) -> ProgressUpdate {
        self.progress
    }

    /// Clips committed by the current or last batch, including those
    /// committed before a failure.
    pub fn committed(&self) -> &[UploadedItem] {
        &self.committed
    }

    /// Outcome of the last successful batch.
    pub fn outcome(&self) -> Option<&UploadOutcome> {
        self.outcome.as_ref()
    }

    /// Upload every artifact with the configured strategy.
    pub async fn upload(
        &mut self,
        artifacts: &[TrimmedArtifact],
        progress: &dyn ProgressSink,
    ) -> UploadResult<UploadOutcome> {
        if artifacts.is_empty() {
            return Err(UploadError::NoArtifacts);
        }

        let strategy = self.strategy();
        let total = artifacts.len();
        self.progress = ProgressUpdate::start(total);
        self.committed.clear();
        self.outcome = None;

        let span = info_span!("upload", strategy, clips = total);
        let result = match self.config.target.clone() {
            UploadTarget::Bulk { endpoint } => {
                self.upload_bulk(&endpoint, artifacts, progress).instrument(span).await
            }
            UploadTarget::TwoPhase {
                media_endpoint,
                record_endpoint,
                parent_id,
            } => {
                self.upload_two_phase(
                    &media_endpoint,
                    &record_endpoint,
                    parent_id.as_deref(),
                    artifacts,
                    progress,
                )
                .instrument(span)
                .await
            }
        };

        match result {
            Ok(()) => {
                metrics::counter!("vtrim_uploads_total", "strategy" => strategy).increment(1);
                let outcome = UploadOutcome {
                    strategy,
                    items: self.committed.clone(),
                    total,
                };
                self.outcome = Some(outcome.clone());
                // No subscribers is fine.
                let _ = self.records_ready.send(());
                info!(strategy, clips = total, "Upload complete");
                Ok(outcome)
            }
            Err(e) => {
                metrics::counter!("vtrim_upload_failures_total", "strategy" => strategy)
                    .increment(1);
                error!(
                    strategy,
                    committed = self.committed.len(),
                    clips = total,
                    "Upload failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn upload_bulk(
        &mut self,
        endpoint: &str,
        artifacts: &[TrimmedArtifact],
        progress: &dyn ProgressSink,
    ) -> UploadResult<()> {
        let mut form = Form::new();
        for artifact in artifacts {
            form = form.part("files[]", file_part(artifact)?);
        }

        debug!(endpoint, "Sending bulk upload");
        let response = self.http.post(endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = status
                .canonical_reason()
                .map(|reason| format!("{} {}", status.as_u16(), reason))
                .unwrap_or_else(|| status.as_str().to_string());
            return Err(UploadError::upload_failed(text));
        }

        self.committed = artifacts
            .iter()
            .enumerate()
            .map(|(index, artifact)| UploadedItem {
                index,
                file_name: artifact.file_name(),
                media_id: None,
                record_id: None,
                title: artifact.display_name().to_string(),
            })
            .collect();
        self.advance(artifacts.len(), artifacts.len(), progress);
        Ok(())
    }

    async fn upload_two_phase(
        &mut self,
        media_endpoint: &str,
        record_endpoint: &str,
        parent_id: Option<&str>,
        artifacts: &[TrimmedArtifact],
        progress: &dyn ProgressSink,
    ) -> UploadResult<()> {
        let total = artifacts.len();

        for (index, artifact) in artifacts.iter().enumerate() {
            let file_name = artifact.file_name();

            // Phase one: media object.
            let form = Form::new().part("file", file_part(artifact)?);
            let response = self.http.post(media_endpoint).multipart(form).send().await?;
            let media: MediaResponse =
                parse_success(response, index, &file_name, |i, r| {
                    UploadError::malformed_media(i, r)
                })
                .await?;
            let media_id = media
                .id()
                .ok_or_else(|| UploadError::malformed_media(index, "missing identifier"))?;
            if media.title().is_none() {
                return Err(UploadError::malformed_media(index, "missing title"));
            }
            debug!(clip = index, media_id = %media_id, "Media created");

            // Phase two: record referencing the media object.
            let request = RecordRequest::publish(
                artifact.display_name(),
                RecordMeta {
                    media_ref: media_id.clone(),
                    duration_classification: classify_duration(&artifact.duration_label()),
                    parent_ref: parent_id.map(str::to_string),
                },
            );
            let response = self.http.post(record_endpoint).json(&request).send().await?;
            let record: RecordResponse =
                parse_success(response, index, &file_name, |i, r| {
                    UploadError::malformed_record(i, r)
                })
                .await?;
            let record_id = record
                .id()
                .ok_or_else(|| UploadError::malformed_record(index, "missing identifier"))?;
            let title = record
                .title()
                .ok_or_else(|| UploadError::malformed_record(index, "missing title"))?
                .to_string();
            debug!(clip = index, record_id = %record_id, "Record created");

            self.committed.push(UploadedItem {
                index,
                file_name,
                media_id: Some(media_id),
                record_id: Some(record_id),
                title,
            });
            self.advance(index + 1, total, progress);
        }

        Ok(())
    }

    fn advance(&mut self, completed: usize, total: usize, progress: &dyn ProgressSink) {
        self.progress = ProgressUpdate::new(completed, total);
        progress.report(self.progress);
    }
}

fn file_part(artifact: &TrimmedArtifact) -> UploadResult<Part> {
    Ok(Part::bytes(artifact.data.to_vec())
        .file_name(artifact.file_name())
        .mime_str(&artifact.mime_type)?)
}

/// Require a 2xx response and decode its JSON body.
async fn parse_success<T: serde::de::DeserializeOwned>(
    response: Response,
    index: usize,
    file_name: &str,
    malformed: fn(usize, String) -> UploadError,
) -> UploadResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message =
            backend_message(&body).unwrap_or_else(|| format!("Upload failed for {}", file_name));
        return Err(UploadError::item_failed(index, message));
    }
    serde_json::from_str(&body).map_err(|e| malformed(index, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;
    use vtrim_models::ProgressLog;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn artifacts(n: usize) -> Vec<TrimmedArtifact> {
        (0..n)
            .map(|i| {
                TrimmedArtifact::new(
                    format!("video{}", i + 1),
                    i,
                    90.0,
                    "video/mp4",
                    Bytes::from(format!("clip-{}", i)),
                )
            })
            .collect()
    }

    fn two_phase(server: &MockServer, parent: Option<&str>) -> UploadOrchestrator {
        let target = UploadTarget::two_phase(
            format!("{}/media", server.uri()),
            format!("{}/records", server.uri()),
            parent.map(str::to_string),
        );
        UploadOrchestrator::new(UploadConfig::new(target)).unwrap()
    }

    fn created(id: u64, title: &str) -> ResponseTemplate {
        ResponseTemplate::new(201).set_body_json(json!({"id": id, "title": {"rendered": title}}))
    }

    #[tokio::test]
    async fn test_bulk_upload_sends_every_file_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("authorization", "Bearer secret"))
            .and(header("x-site", "lessons"))
            .and(body_string_contains("filename=\"video1.mp4\""))
            .and(body_string_contains("filename=\"video2.mp4\""))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = UploadConfig::new(UploadTarget::bulk(format!("{}/upload", server.uri())))
            .with_bearer("secret")
            .with_header("X-Site", "lessons");
        let mut orchestrator = UploadOrchestrator::new(config).unwrap();
        let mut ready = orchestrator.subscribe();
        let progress = ProgressLog::new();

        let outcome = orchestrator.upload(&artifacts(2), &progress).await.unwrap();

        assert_eq!(outcome.strategy, "bulk");
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(progress.updates(), vec![ProgressUpdate::new(2, 2)]);
        assert!(ready.try_recv().is_ok());
        assert!(ready.try_recv().is_err(), "records-ready is sent once");
    }

    #[tokio::test]
    async fn test_bulk_failure_commits_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = UploadConfig::new(UploadTarget::bulk(server.uri()));
        let mut orchestrator = UploadOrchestrator::new(config).unwrap();
        let mut ready = orchestrator.subscribe();

        let err = orchestrator
            .upload(&artifacts(3), &ProgressLog::new())
            .await
            .unwrap_err();

        assert!(
            matches!(err, UploadError::UploadFailed(ref s) if s == "500 Internal Server Error")
        );
        assert!(orchestrator.committed().is_empty());
        assert!(orchestrator.outcome().is_none());
        assert!(ready.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_two_phase_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/media"))
            .and(body_string_contains("name=\"file\""))
            .respond_with(created(7, "video1"))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/records"))
            .and(body_string_contains("\"mediaRef\":\"7\""))
            .and(body_string_contains("\"parentRef\":\"course-9\""))
            .and(body_string_contains(
                "\"durationClassification\":{\"value\":2,\"unit\":\"minute\"}",
            ))
            .respond_with(created(100, "Lesson"))
            .expect(2)
            .mount(&server)
            .await;

        let mut orchestrator = two_phase(&server, Some("course-9"));
        let progress = ProgressLog::new();

        let outcome = orchestrator.upload(&artifacts(2), &progress).await.unwrap();

        assert_eq!(outcome.strategy, "two_phase");
        assert_eq!(outcome.items[0].media_id.as_deref(), Some("7"));
        assert_eq!(outcome.items[1].record_id.as_deref(), Some("100"));
        assert_eq!(
            progress.updates(),
            vec![ProgressUpdate::new(1, 2), ProgressUpdate::new(2, 2)]
        );
        assert_eq!(orchestrator.outcome(), Some(&outcome));
    }

    #[tokio::test]
    async fn test_two_phase_stops_at_failed_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/media"))
            .respond_with(created(7, "clip"))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/records"))
            .respond_with(created(100, "clip"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/records"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"message": "Record rejected"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut orchestrator = two_phase(&server, None);
        let progress = ProgressLog::new();

        let err = orchestrator.upload(&artifacts(3), &progress).await.unwrap_err();

        assert!(matches!(err, UploadError::ItemFailed { index: 1, .. }));
        assert_eq!(err.to_string(), "Record rejected");
        assert_eq!(orchestrator.committed().len(), 1);
        assert_eq!(progress.last(), Some(ProgressUpdate::new(1, 3)));
        assert_eq!(orchestrator.progress().counter_label(), "1 of 3");
    }

    #[tokio::test]
    async fn test_two_phase_generic_message_without_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/media"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let mut orchestrator = two_phase(&server, None);
        let err = orchestrator
            .upload(&artifacts(1), &ProgressLog::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Upload failed for video1.mp4");
    }

    #[tokio::test]
    async fn test_two_phase_rejects_media_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/media"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"title": {"rendered": "x"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/records"))
            .respond_with(created(1, "x"))
            .expect(0)
            .mount(&server)
            .await;

        let mut orchestrator = two_phase(&server, None);
        let err = orchestrator
            .upload(&artifacts(1), &ProgressLog::new())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::MalformedMediaResponse { index: 0, .. }));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let config = UploadConfig::new(UploadTarget::bulk("http://127.0.0.1:9/upload"));
        let mut orchestrator = UploadOrchestrator::new(config).unwrap();
        let err = orchestrator.upload(&[], &ProgressLog::new()).await.unwrap_err();
        assert!(matches!(err, UploadError::NoArtifacts));
    }
}
