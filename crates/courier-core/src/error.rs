// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier bridge.

use thiserror::Error;

use crate::types::MediaKind;

/// The error type shared by every Courier crate.
///
/// None of these are fatal to the process. The dispatcher converts each one
/// into an error record; only a superseded session stops the bridge.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors discovered after loading (bad URL, unusable address).
    #[error("configuration error: {0}")]
    Config(String),

    /// The protocol client failed (presence, decryption, RPC transport).
    #[error("session error: {message}")]
    Session {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Retrieving or decrypting an attachment failed.
    #[error("failed to download {media}: {message}")]
    Download { media: MediaKind, message: String },

    /// An outbound payload could not be encoded as JSON.
    #[error("failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),

    /// The record-store rejected the submission or could not be reached.
    #[error("delivery failed: {message}")]
    Delivery {
        message: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A history snapshot could not be written.
    #[error("failed to persist {path}: {source}")]
    Persistence {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Shorthand for a [`CourierError::Session`] without an underlying cause.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status of a failed delivery, if the record-store answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Delivery { status, .. } => *status,
            _ => None,
        }
    }
}
