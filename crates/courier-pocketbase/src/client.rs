// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the record-store's events and errors collections.
//!
//! Every submission is a single request: no retry, no backoff, and no
//! timeout beyond the transport default. Payloads are encoded before any
//! network I/O, so an encoding failure never reaches the wire.

use async_trait::async_trait;
use courier_config::model::RecordStoreConfig;
use courier_core::{CourierError, EventLabel, InboundEvent, RecordSink, ResolvedFile};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Longest response body quoted in a delivery error.
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct EventPayload<'a> {
    #[serde(rename = "type")]
    label: EventLabel,
    raw: &'a InboundEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra: Option<&'a Value>,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    #[serde(rename = "type")]
    label: EventLabel,
    error: &'a str,
    raw: &'a InboundEvent,
}

/// Delivery client for a PocketBase-style record-store.
#[derive(Debug, Clone)]
pub struct PocketBaseClient {
    client: reqwest::Client,
    events_url: String,
    errors_url: String,
}

impl PocketBaseClient {
    /// Creates a client for the configured endpoints.
    pub fn new(config: &RecordStoreConfig) -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CourierError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            events_url: config.events_url(),
            errors_url: config.errors_url(),
        })
    }

    pub fn events_url(&self) -> &str {
        &self.events_url
    }

    pub fn errors_url(&self) -> &str {
        &self.errors_url
    }

    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<(), CourierError> {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body);
        self.send(request).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(), CourierError> {
        let response = request.send().await.map_err(|e| CourierError::Delivery {
            message: format!("HTTP request failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(status = %status, url = %response.url(), "record-store response received");
        if status == StatusCode::OK {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(CourierError::Delivery {
            message: format!("record-store returned {status}: {body}"),
            status: Some(status.as_u16()),
            source: None,
        })
    }
}

#[async_trait]
impl RecordSink for PocketBaseClient {
    async fn post_event(
        &self,
        label: EventLabel,
        raw: &InboundEvent,
        extra: Option<&Value>,
    ) -> Result<(), CourierError> {
        let body = serde_json::to_vec(&EventPayload { label, raw, extra })?;
        self.post_json(&self.events_url, body).await
    }

    async fn post_event_file(
        &self,
        label: EventLabel,
        raw: &InboundEvent,
        extra: Option<&Value>,
        file: &ResolvedFile,
    ) -> Result<(), CourierError> {
        let raw_json = serde_json::to_string(raw)?;
        let extra_json = serde_json::to_string(&extra)?;

        let file_part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| CourierError::Internal(format!("invalid file part: {e}")))?;

        let form = Form::new()
            .text("type", label.to_string())
            .text("raw", raw_json)
            .text("extra", extra_json)
            .part("file", file_part);

        debug!(
            label = %label,
            file_name = %file.file_name,
            size = file.bytes.len(),
            "posting multipart record"
        );
        self.send(self.client.post(&self.events_url).multipart(form))
            .await
    }

    async fn post_error(
        &self,
        label: EventLabel,
        reason: &str,
        raw: &InboundEvent,
    ) -> Result<(), CourierError> {
        let body = serde_json::to_vec(&ErrorPayload {
            label,
            error: reason,
            raw,
        })?;
        self.post_json(&self.errors_url, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EVENTS: &str = "/api/collections/events/records";
    const ERRORS: &str = "/api/collections/errors/records";

    fn test_client(base_url: &str) -> PocketBaseClient {
        PocketBaseClient::new(&RecordStoreConfig {
            url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn connected() -> InboundEvent {
        serde_json::from_value(json!({"type": "Connected", "payload": {}})).unwrap()
    }

    async fn last_body(server: &MockServer) -> Vec<u8> {
        let requests = server.received_requests().await.expect("recording enabled");
        requests.last().expect("one request").body.clone()
    }

    #[tokio::test]
    async fn post_event_sends_json_envelope_without_extra() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EVENTS))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client
            .post_event(EventLabel::Connected, &connected(), None)
            .await
            .unwrap();

        let body: Value = serde_json::from_slice(&last_body(&server).await).unwrap();
        assert_eq!(
            body,
            json!({"type": "Connected", "raw": {"type": "Connected", "payload": {}}})
        );
    }

    #[tokio::test]
    async fn post_event_includes_extra_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EVENTS))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let extra = json!({"selectedOptions": ["yes"]});
        test_client(&server.uri())
            .post_event(EventLabel::PollVote, &connected(), Some(&extra))
            .await
            .unwrap();

        let body: Value = serde_json::from_slice(&last_body(&server).await).unwrap();
        assert_eq!(body["type"], "Message.GetPollUpdateMessage");
        assert_eq!(body["extra"], extra);
    }

    #[tokio::test]
    async fn non_200_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EVENTS))
            .respond_with(ResponseTemplate::new(400).set_body_string("validation_failed"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .post_event(EventLabel::Connected, &connected(), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("validation_failed"), "got: {err}");
    }

    #[tokio::test]
    async fn created_status_is_still_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .post_event(EventLabel::Connected, &connected(), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(204));
    }

    #[tokio::test]
    async fn unreachable_store_reports_transport_failure() {
        let err = test_client("http://127.0.0.1:1")
            .post_event(EventLabel::Connected, &connected(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Delivery { status: None, .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn multipart_has_four_parts_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EVENTS))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let file = ResolvedFile {
            file_name: "ABC123.jpg".into(),
            bytes: b"\xff\xd8\xff jpeg bytes".to_vec(),
        };
        test_client(&server.uri())
            .post_event_file(EventLabel::Image, &connected(), None, &file)
            .await
            .unwrap();

        let body = String::from_utf8_lossy(&last_body(&server).await).into_owned();
        let position = |needle: &str| {
            body.find(needle)
                .unwrap_or_else(|| panic!("missing {needle} in {body}"))
        };
        let type_at = position("name=\"type\"");
        let raw_at = position("name=\"raw\"");
        let extra_at = position("name=\"extra\"");
        let file_at = position("name=\"file\"");
        assert!(type_at < raw_at && raw_at < extra_at && extra_at < file_at);
        assert!(body.contains("filename=\"ABC123.jpg\""));
        assert!(body.contains("Message.GetImageMessage"));
        assert!(body.contains("jpeg bytes"));
        // `extra` is JSON-encoded even when absent.
        assert!(body[extra_at..file_at].contains("null"));
    }

    #[tokio::test]
    async fn multipart_non_200_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(413))
            .mount(&server)
            .await;

        let file = ResolvedFile {
            file_name: "big.mp4".into(),
            bytes: vec![0; 16],
        };
        let err = test_client(&server.uri())
            .post_event_file(EventLabel::Video, &connected(), None, &file)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(413));
    }

    #[tokio::test]
    async fn post_error_targets_errors_collection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ERRORS))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server.uri())
            .post_error(EventLabel::StreamReplaced, "Stream replaced", &connected())
            .await
            .unwrap();

        let body: Value = serde_json::from_slice(&last_body(&server).await).unwrap();
        assert_eq!(body["type"], "StreamReplaced");
        assert_eq!(body["error"], "Stream replaced");
        assert_eq!(body["raw"]["type"], "Connected");
    }
}
