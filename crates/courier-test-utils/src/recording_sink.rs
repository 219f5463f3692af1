// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record sink that captures submissions for assertion in tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use courier_core::{CourierError, EventLabel, InboundEvent, RecordSink, ResolvedFile};

/// One submission, with `raw` already encoded the way the record-store sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Posted {
    Event {
        label: EventLabel,
        raw: Value,
        extra: Option<Value>,
    },
    File {
        label: EventLabel,
        raw: Value,
        extra: Option<Value>,
        file: ResolvedFile,
    },
    Error {
        label: EventLabel,
        reason: String,
        raw: Value,
    },
}

impl Posted {
    pub fn label(&self) -> EventLabel {
        match self {
            Self::Event { label, .. } | Self::File { label, .. } | Self::Error { label, .. } => {
                *label
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Captures every submission. Attempts are recorded even when the sink is
/// configured to fail them.
#[derive(Default)]
pub struct RecordingSink {
    posted: Arc<Mutex<Vec<Posted>>>,
    fail_events: AtomicBool,
    fail_errors: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails `post_event` and `post_event_file` with a 500.
    pub fn fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    /// Fails `post_error` with a 500.
    pub fn fail_errors(&self, fail: bool) {
        self.fail_errors.store(fail, Ordering::SeqCst);
    }

    pub async fn posted(&self) -> Vec<Posted> {
        self.posted.lock().await.clone()
    }

    pub async fn labels(&self) -> Vec<EventLabel> {
        self.posted.lock().await.iter().map(Posted::label).collect()
    }

    pub async fn count(&self) -> usize {
        self.posted.lock().await.len()
    }

    pub async fn error_reasons(&self) -> Vec<String> {
        self.posted
            .lock()
            .await
            .iter()
            .filter_map(|p| match p {
                Posted::Error { reason, .. } => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }

    async fn push(&self, posted: Posted, fail: &AtomicBool) -> Result<(), CourierError> {
        self.posted.lock().await.push(posted);
        if fail.load(Ordering::SeqCst) {
            return Err(CourierError::Delivery {
                message: "record-store returned 500 Internal Server Error".into(),
                status: Some(500),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSink for RecordingSink {
    async fn post_event(
        &self,
        label: EventLabel,
        raw: &InboundEvent,
        extra: Option<&Value>,
    ) -> Result<(), CourierError> {
        let posted = Posted::Event {
            label,
            raw: serde_json::to_value(raw)?,
            extra: extra.cloned(),
        };
        self.push(posted, &self.fail_events).await
    }

    async fn post_event_file(
        &self,
        label: EventLabel,
        raw: &InboundEvent,
        extra: Option<&Value>,
        file: &ResolvedFile,
    ) -> Result<(), CourierError> {
        let posted = Posted::File {
            label,
            raw: serde_json::to_value(raw)?,
            extra: extra.cloned(),
            file: file.clone(),
        };
        self.push(posted, &self.fail_events).await
    }

    async fn post_error(
        &self,
        label: EventLabel,
        reason: &str,
        raw: &InboundEvent,
    ) -> Result<(), CourierError> {
        let posted = Posted::Error {
            label,
            reason: reason.to_string(),
            raw: serde_json::to_value(raw)?,
        };
        self.push(posted, &self.fail_errors).await
    }
}
