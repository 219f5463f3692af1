// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: dispatcher, real delivery client, mock record-store.

use std::sync::Arc;

use courier_bridge::{Dispatcher, Flow, HistoryWriter};
use courier_config::model::RecordStoreConfig;
use courier_pocketbase::PocketBaseClient;
use courier_test_utils::{event, MockProtocolClient};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENTS: &str = "/api/collections/events/records";
const ERRORS: &str = "/api/collections/errors/records";

async fn record_store() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

fn dispatcher(server: &MockServer, client: MockProtocolClient, history: HistoryWriter) -> Dispatcher {
    let sink = PocketBaseClient::new(&RecordStoreConfig {
        url: server.uri(),
        ..Default::default()
    })
    .unwrap();
    Dispatcher::new(Arc::new(client), Arc::new(sink), history)
}

/// (path, body) of every request the store received, in order.
async fn requests(server: &MockServer) -> Vec<(String, Vec<u8>)> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.url.path().to_string(), r.body))
        .collect()
}

#[tokio::test]
async fn image_message_is_posted_as_multipart_with_named_file() {
    let server = record_store().await;
    let dir = tempfile::tempdir().unwrap();
    let bridge = dispatcher(
        &server,
        MockProtocolClient::new().with_download(b"\xff\xd8jpeg"),
        HistoryWriter::new(dir.path()),
    );

    let flow = bridge
        .handle(&event(json!({
            "type": "Message",
            "payload": {
                "Info": {"ID": "ABC123", "Sender": "alice"},
                "Message": {"imageMessage": {"mimetype": "image/jpeg", "fileLength": 4}}
            }
        })))
        .await;
    assert_eq!(flow, Flow::Continue);

    let requests = requests(&server).await;
    assert_eq!(requests.len(), 1);
    let (path, body) = &requests[0];
    assert_eq!(path, EVENTS);
    let body = String::from_utf8_lossy(body);
    assert!(body.contains("name=\"file\"; filename=\"ABC123.jpg\""), "body: {body}");
    assert!(body.contains("Message.GetImageMessage"));
}

#[tokio::test]
async fn played_receipt_makes_no_calls() {
    let server = record_store().await;
    let dir = tempfile::tempdir().unwrap();
    let bridge = dispatcher(&server, MockProtocolClient::new(), HistoryWriter::new(dir.path()));

    bridge
        .handle(&event(json!({"type": "Receipt", "payload": {"Type": "played"}})))
        .await;

    assert!(requests(&server).await.is_empty());
}

#[tokio::test]
async fn stream_replaced_posts_one_error_and_halts() {
    let server = record_store().await;
    let dir = tempfile::tempdir().unwrap();
    let bridge = dispatcher(&server, MockProtocolClient::new(), HistoryWriter::new(dir.path()));

    let incoming = [
        event(json!({"type": "StreamReplaced", "payload": {}})),
        event(json!({"type": "Blocklist", "payload": {}})),
    ];
    // Mirrors the serve loop: nothing after a halt is handled.
    for e in &incoming {
        if bridge.handle(e).await == Flow::Halt {
            break;
        }
    }

    let requests = requests(&server).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, ERRORS);
    let body: Value = serde_json::from_slice(&requests[0].1).unwrap();
    assert_eq!(body["type"], "StreamReplaced");
    assert_eq!(body["error"], "Stream replaced");
}

#[tokio::test]
async fn history_write_failure_is_reported_and_processing_continues() {
    let server = record_store().await;
    let dir = tempfile::tempdir().unwrap();
    let bridge = dispatcher(
        &server,
        MockProtocolClient::new(),
        HistoryWriter::new(dir.path().join("missing")),
    );

    let sync = event(json!({"type": "HistorySync", "payload": {"Data": {"conversations": []}}}));
    assert_eq!(bridge.handle(&sync).await, Flow::Continue);
    assert_eq!(
        bridge
            .handle(&event(json!({"type": "KeepAliveRestored", "payload": {}})))
            .await,
        Flow::Continue
    );

    let requests = requests(&server).await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, ERRORS);
    let error: Value = serde_json::from_slice(&requests[0].1).unwrap();
    assert_eq!(error["type"], "HistorySync");
    assert_eq!(requests[1].0, EVENTS);
    let next: Value = serde_json::from_slice(&requests[1].1).unwrap();
    assert_eq!(next["type"], "KeepAliveRestored");
}

#[tokio::test]
async fn unknown_event_raw_round_trips() {
    let server = record_store().await;
    let dir = tempfile::tempdir().unwrap();
    let bridge = dispatcher(&server, MockProtocolClient::new(), HistoryWriter::new(dir.path()));

    let raw = json!({"type": "GroupInfo", "payload": {"JID": "123@g.us", "Name": {"Name": "family"}}});
    bridge.handle(&event(raw.clone())).await;

    let requests = requests(&server).await;
    let body: Value = serde_json::from_slice(&requests[0].1).unwrap();
    assert_eq!(body, json!({"type": "UnknownEvent", "raw": raw}));
}

#[tokio::test]
async fn rejected_forward_becomes_error_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EVENTS))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ERRORS))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let bridge = dispatcher(&server, MockProtocolClient::new(), HistoryWriter::new(dir.path()));

    bridge
        .handle(&event(json!({"type": "KeepAliveTimeout", "payload": {"ErrorCount": 3}})))
        .await;

    let requests = requests(&server).await;
    let error: Value = serde_json::from_slice(&requests[1].1).unwrap();
    assert_eq!(error["type"], "KeepAliveTimeout");
    assert_eq!(error["error"], "Failed to forward event");
    assert_eq!(error["raw"]["payload"]["ErrorCount"], 3);
}
