// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides deterministic stand-ins for the bridge's collaborators so the
//! dispatcher can be exercised without a protocol daemon or a record-store.
//!
//! # Components
//!
//! - [`MockProtocolClient`] - Scriptable protocol client that records every call
//! - [`RecordingSink`] - Record sink that captures submissions and can be told to fail
//! - [`StaticApprover`] - Pairing approver with a fixed answer
//! - [`event`] - Builds an [`InboundEvent`](courier_core::InboundEvent) from JSON

pub mod mock_protocol;
pub mod recording_sink;

use async_trait::async_trait;
use courier_core::{InboundEvent, PairingApprover, PairingRequest};

pub use mock_protocol::{MockProtocolClient, ProtocolCall};
pub use recording_sink::{Posted, RecordingSink};

/// Decodes an event envelope, panicking on malformed test input.
pub fn event(value: serde_json::Value) -> InboundEvent {
    serde_json::from_value(value).expect("test event should decode")
}

/// A pairing approver that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticApprover(pub bool);

#[async_trait]
impl PairingApprover for StaticApprover {
    async fn approve(&self, _request: &PairingRequest) -> bool {
        self.0
    }
}
