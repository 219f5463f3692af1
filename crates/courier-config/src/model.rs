// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a misspelled key
//! is reported at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Connection to the protocol daemon.
    #[serde(default)]
    pub session: SessionConfig,

    /// Record-store endpoints.
    #[serde(default)]
    pub record_store: RecordStoreConfig,

    /// History snapshot output.
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Protocol daemon connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// `host:port` of the daemon's JSON-RPC listener.
    #[serde(default = "default_session_address")]
    pub address: String,

    /// Ask for a full (one year) history sync when logging in.
    #[serde(default)]
    pub request_full_sync: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: default_session_address(),
            request_full_sync: false,
        }
    }
}

fn default_session_address() -> String {
    "127.0.0.1:7583".to_string()
}

/// Where classified events and error records are submitted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecordStoreConfig {
    /// Base URL of the record-store.
    #[serde(default = "default_record_store_url")]
    pub url: String,

    /// Path of the events collection endpoint.
    #[serde(default = "default_events_path")]
    pub events_path: String,

    /// Path of the error records endpoint.
    #[serde(default = "default_errors_path")]
    pub errors_path: String,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            url: default_record_store_url(),
            events_path: default_events_path(),
            errors_path: default_errors_path(),
        }
    }
}

impl RecordStoreConfig {
    /// Full URL of the events endpoint.
    pub fn events_url(&self) -> String {
        join_url(&self.url, &self.events_path)
    }

    /// Full URL of the error records endpoint.
    pub fn errors_url(&self) -> String {
        join_url(&self.url, &self.errors_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

fn default_record_store_url() -> String {
    "http://pocketbase:8090".to_string()
}

fn default_events_path() -> String {
    "/api/collections/events/records".to_string()
}

fn default_errors_path() -> String {
    "/api/collections/errors/records".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Directory that receives `history-<start>-<seq>.json` snapshots.
    #[serde(default = "default_history_path")]
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

fn default_history_path() -> String {
    "ws_data/history".to_string()
}
