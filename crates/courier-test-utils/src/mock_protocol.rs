// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock protocol client for deterministic testing.
//!
//! `MockProtocolClient` implements `ProtocolClient` with scripted results and
//! captures every call for assertion in tests.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use courier_core::{
    AttachmentDescriptor, CourierError, MediaKind, MessageEvent, Presence, ProtocolClient,
};

/// One call made against the mock, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolCall {
    SendPresence(Presence),
    Download { kind: MediaKind, mime_type: String },
    DecryptPollVote { message_id: String },
    DecryptReaction { message_id: String },
    Disconnect,
}

/// A scriptable protocol client.
///
/// By default it has no push name, presence succeeds, downloads return
/// `b"mock-media"`, and both decrypt operations fail.
pub struct MockProtocolClient {
    push_name: StdMutex<Option<String>>,
    presence_fails: bool,
    download: Result<Vec<u8>, String>,
    poll_vote: Option<Value>,
    reaction: Option<Value>,
    calls: Arc<Mutex<Vec<ProtocolCall>>>,
}

impl MockProtocolClient {
    pub fn new() -> Self {
        Self {
            push_name: StdMutex::new(None),
            presence_fails: false,
            download: Ok(b"mock-media".to_vec()),
            poll_vote: None,
            reaction: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_push_name(self, name: &str) -> Self {
        self.set_push_name(Some(name.to_string()));
        self
    }

    /// Makes every `send_presence` call fail.
    pub fn failing_presence(mut self) -> Self {
        self.presence_fails = true;
        self
    }

    pub fn with_download(mut self, bytes: &[u8]) -> Self {
        self.download = Ok(bytes.to_vec());
        self
    }

    /// Makes every download fail with the given message.
    pub fn failing_download(mut self, message: &str) -> Self {
        self.download = Err(message.to_string());
        self
    }

    pub fn with_poll_vote(mut self, vote: Value) -> Self {
        self.poll_vote = Some(vote);
        self
    }

    pub fn with_reaction(mut self, reaction: Value) -> Self {
        self.reaction = Some(reaction);
        self
    }

    /// Replaces the push name, as a session update would.
    pub fn set_push_name(&self, name: Option<String>) {
        *self.push_name.lock().unwrap_or_else(|e| e.into_inner()) = name;
    }

    /// All calls made so far.
    pub async fn calls(&self) -> Vec<ProtocolCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: ProtocolCall) {
        self.calls.lock().await.push(call);
    }
}

impl Default for MockProtocolClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolClient for MockProtocolClient {
    fn push_name(&self) -> Option<String> {
        self.push_name
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn send_presence(&self, presence: Presence) -> Result<(), CourierError> {
        self.record(ProtocolCall::SendPresence(presence)).await;
        if self.presence_fails {
            return Err(CourierError::session("presence rejected by mock"));
        }
        Ok(())
    }

    async fn download(
        &self,
        descriptor: &AttachmentDescriptor<'_>,
    ) -> Result<Vec<u8>, CourierError> {
        self.record(ProtocolCall::Download {
            kind: descriptor.kind,
            mime_type: descriptor.mime_type.to_string(),
        })
        .await;
        self.download.clone().map_err(|message| CourierError::Download {
            media: descriptor.kind,
            message,
        })
    }

    async fn decrypt_poll_vote(&self, message: &MessageEvent) -> Result<Value, CourierError> {
        self.record(ProtocolCall::DecryptPollVote {
            message_id: message.info.id.clone(),
        })
        .await;
        self.poll_vote
            .clone()
            .ok_or_else(|| CourierError::session("no poll vote scripted"))
    }

    async fn decrypt_reaction(&self, message: &MessageEvent) -> Result<Value, CourierError> {
        self.record(ProtocolCall::DecryptReaction {
            message_id: message.info.id.clone(),
        })
        .await;
        self.reaction
            .clone()
            .ok_or_else(|| CourierError::session("no reaction scripted"))
    }

    async fn disconnect(&self) -> Result<(), CourierError> {
        self.record(ProtocolCall::Disconnect).await;
        Ok(())
    }
}
