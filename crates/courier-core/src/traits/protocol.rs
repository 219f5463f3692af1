// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The protocol client that owns the authenticated messaging session.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CourierError;
use crate::event::{AttachmentDescriptor, MessageEvent};
use crate::types::Presence;

/// Operations the dispatcher needs from the messaging session.
///
/// Implementations decode wire events, hold the encryption state, and talk
/// to the network; the bridge only asks them to act on its behalf.
#[async_trait]
pub trait ProtocolClient: Send + Sync + 'static {
    /// The account's own display name, once the session has learned it.
    fn push_name(&self) -> Option<String>;

    /// Announces our presence state to contacts.
    async fn send_presence(&self, presence: Presence) -> Result<(), CourierError>;

    /// Downloads and decrypts an attachment.
    async fn download(&self, descriptor: &AttachmentDescriptor<'_>) -> Result<Vec<u8>, CourierError>;

    /// Decrypts the vote carried by a poll-update message.
    async fn decrypt_poll_vote(&self, message: &MessageEvent) -> Result<Value, CourierError>;

    /// Decrypts an encrypted reaction message.
    async fn decrypt_reaction(&self, message: &MessageEvent) -> Result<Value, CourierError>;

    /// Closes the session gracefully.
    async fn disconnect(&self) -> Result<(), CourierError>;
}
