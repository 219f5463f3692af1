// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destination for forwarded events and error records.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CourierError;
use crate::event::InboundEvent;
use crate::types::{EventLabel, ResolvedFile};

/// A record-store that accepts classified events.
///
/// Each call is a single attempt. Implementations must not retry; a failure
/// is returned to the dispatcher, which decides what to report.
#[async_trait]
pub trait RecordSink: Send + Sync + 'static {
    /// Submits `{type, raw, extra}` to the events collection.
    async fn post_event(
        &self,
        label: EventLabel,
        raw: &InboundEvent,
        extra: Option<&Value>,
    ) -> Result<(), CourierError>;

    /// Submits the event together with an attachment as a multipart form.
    async fn post_event_file(
        &self,
        label: EventLabel,
        raw: &InboundEvent,
        extra: Option<&Value>,
        file: &ResolvedFile,
    ) -> Result<(), CourierError>;

    /// Submits `{type, error, raw}` to the errors collection.
    async fn post_error(
        &self,
        label: EventLabel,
        reason: &str,
        raw: &InboundEvent,
    ) -> Result<(), CourierError>;
}
