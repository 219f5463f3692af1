// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC 2.0 frames exchanged with the protocol daemon.
//!
//! One frame per line. The daemon sends notifications (`event`, `session`,
//! `qr`), one request type (`pair_request`), and responses to our calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// A call from the bridge to the daemon.
#[derive(Debug, Serialize)]
pub struct Request<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

impl<'a, P: Serialize> Request<'a, P> {
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

/// Our answer to a daemon-initiated request.
#[derive(Debug, Serialize)]
pub struct Response<'a> {
    pub jsonrpc: &'static str,
    pub id: &'a Value,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Any frame received from the daemon, before it is told apart.
#[derive(Debug, Deserialize)]
pub struct RawFrame {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// A received frame, by role.
#[derive(Debug, PartialEq)]
pub enum Frame {
    Notification { method: String, params: Value },
    Request { id: Value, method: String, params: Value },
    Response { id: u64, outcome: Result<Value, RpcError> },
}

impl Frame {
    /// Parses one line. Returns `None` for frames that fit no role.
    pub fn parse(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let raw: RawFrame = serde_json::from_str(line)?;
        let frame = match (raw.method, raw.id) {
            (Some(method), None) => Some(Self::Notification {
                method,
                params: raw.params,
            }),
            (Some(method), Some(id)) => Some(Self::Request {
                id,
                method,
                params: raw.params,
            }),
            (None, Some(id)) => id.as_u64().map(|id| Self::Response {
                id,
                outcome: match raw.error {
                    Some(error) => Err(error),
                    None => Ok(raw.result.unwrap_or(Value::Null)),
                },
            }),
            (None, None) => None,
        };
        Ok(frame)
    }
}

/// Params of the `session` notification.
#[derive(Debug, Default, Deserialize)]
pub struct SessionUpdate {
    #[serde(default)]
    pub push_name: Option<String>,
}

/// A login QR channel item: a code to display, or a terminal result such as
/// `success` or `timeout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QrEvent {
    pub event: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl QrEvent {
    /// The code to render, when this item carries one.
    pub fn code(&self) -> Option<&str> {
        if self.event == "code" {
            self.code.as_deref()
        } else {
            None
        }
    }
}
