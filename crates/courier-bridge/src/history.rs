// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local snapshots of bulk history-sync payloads.
//!
//! Each snapshot goes to `history-<start>-<seq>.json`, where `<start>` is the
//! writer's creation time in Unix seconds and `<seq>` comes from a counter
//! that starts at 1 and only grows.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use courier_core::CourierError;

pub struct HistoryWriter {
    dir: PathBuf,
    started_at: i64,
    sequence: AtomicU32,
}

impl HistoryWriter {
    /// Creates a writer for `dir`, stamped with the current time.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_start_time(dir, chrono::Utc::now().timestamp())
    }

    pub fn with_start_time(dir: impl Into<PathBuf>, started_at: i64) -> Self {
        Self {
            dir: dir.into(),
            started_at,
            sequence: AtomicU32::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserves the next sequence number.
    pub fn next_sequence(&self) -> u32 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn path_for(&self, sequence: u32) -> PathBuf {
        self.dir
            .join(format!("history-{}-{sequence}.json", self.started_at))
    }

    /// Writes one snapshot and returns its path.
    ///
    /// The file is created exclusively with mode `0600`; an existing file with
    /// the same name is an error, never overwritten.
    pub async fn persist(&self, payload: &Value) -> Result<PathBuf, CourierError> {
        let path = self.path_for(self.next_sequence());

        let mut body = serde_json::to_vec_pretty(payload)?;
        body.push(b'\n');

        let persistence = |e: std::io::Error| CourierError::Persistence {
            path: path.display().to_string(),
            source: Box::new(e),
        };

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&path).await.map_err(persistence)?;
        file.write_all(&body).await.map_err(persistence)?;
        file.flush().await.map_err(persistence)?;

        debug!(path = %path.display(), bytes = body.len(), "history snapshot written");
        Ok(path)
    }
}
