// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protocol client backed by a JSON-RPC connection to the protocol daemon.
//!
//! A background reader task owns the read half of the socket. It routes
//! responses to waiting calls, answers pairing requests through the
//! configured [`PairingApprover`], and pushes events and QR items into
//! channels returned by [`RpcSession::connect`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use courier_core::{
    AttachmentDescriptor, CourierError, InboundEvent, MessageEvent, PairingApprover,
    PairingRequest, Presence, ProtocolClient,
};

use crate::rpc::{Frame, QrEvent, Request, Response, SessionUpdate, JSONRPC_VERSION};

/// QR items buffered before new ones are dropped.
const QR_BUFFER: usize = 8;

type Waiter = oneshot::Sender<Result<Value, CourierError>>;

/// Calls awaiting a response. Once `closed`, no new waiter is accepted.
#[derive(Default)]
struct Pending {
    closed: bool,
    waiters: HashMap<u64, Waiter>,
}

/// Receivers for what the daemon pushes.
pub struct SessionStreams {
    /// Ends when the connection closes.
    pub events: mpsc::UnboundedReceiver<InboundEvent>,
    pub qr: mpsc::Receiver<QrEvent>,
}

#[derive(Deserialize)]
struct ConnectResult {
    #[serde(default)]
    push_name: Option<String>,
}

#[derive(Deserialize)]
struct DownloadResult {
    data: String,
}

#[derive(Serialize)]
struct DownloadParams<'a> {
    kind: courier_core::MediaKind,
    mimetype: &'a str,
    media: &'a courier_core::MediaMessage,
}

pub struct RpcSession {
    writer: Arc<Mutex<OwnedWriteHalf>>,
    pending: Arc<Mutex<Pending>>,
    next_id: AtomicU64,
    push_name: Arc<ArcSwapOption<String>>,
}

impl RpcSession {
    /// Opens the connection and starts the reader task.
    pub async fn connect(
        address: &str,
        approver: Arc<dyn PairingApprover>,
    ) -> Result<(Arc<Self>, SessionStreams), CourierError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| CourierError::Session {
                message: format!("failed to connect to protocol daemon at {address}: {e}"),
                source: Some(Box::new(e)),
            })?;
        info!(address, "connected to protocol daemon");
        let (read_half, write_half) = stream.into_split();

        let session = Arc::new(Self {
            writer: Arc::new(Mutex::new(write_half)),
            pending: Arc::new(Mutex::new(Pending::default())),
            next_id: AtomicU64::new(1),
            push_name: Arc::new(ArcSwapOption::empty()),
        });

        // Events are unbounded so a response never waits behind queued events
        // while the dispatcher is blocked on that response.
        let (event_tx, events) = mpsc::unbounded_channel();
        let (qr_tx, qr) = mpsc::channel(QR_BUFFER);
        let reader = Reader {
            writer: Arc::clone(&session.writer),
            pending: Arc::clone(&session.pending),
            push_name: Arc::clone(&session.push_name),
            approver,
            event_tx,
            qr_tx,
        };
        tokio::spawn(reader.run(read_half));

        Ok((session, SessionStreams { events, qr }))
    }

    /// Logs in, asking for full history when `request_full_sync` is set.
    pub async fn start(&self, request_full_sync: bool) -> Result<(), CourierError> {
        let result = self
            .call("connect", json!({ "request_full_sync": request_full_sync }))
            .await?;
        let ConnectResult { push_name } = serde_json::from_value(result).unwrap_or(ConnectResult {
            push_name: None,
        });
        if let Some(name) = push_name {
            self.push_name.store(Some(Arc::new(name)));
        }
        Ok(())
    }

    async fn call<P: Serialize>(&self, method: &str, params: P) -> Result<Value, CourierError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = encode_line(&Request::new(id, method, params))?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.closed {
                return Err(CourierError::session("protocol daemon connection closed"));
            }
            pending.waiters.insert(id, tx);
        }

        debug!(id, method, "calling protocol daemon");
        if let Err(e) = write_line(&self.writer, &line).await {
            self.pending.lock().await.waiters.remove(&id);
            return Err(e);
        }

        rx.await
            .unwrap_or_else(|_| Err(CourierError::session("protocol daemon connection closed")))
    }
}

#[async_trait]
impl ProtocolClient for RpcSession {
    fn push_name(&self) -> Option<String> {
        self.push_name.load_full().map(|name| name.as_ref().clone())
    }

    async fn send_presence(&self, presence: Presence) -> Result<(), CourierError> {
        self.call("send_presence", json!({ "state": presence }))
            .await
            .map(|_| ())
    }

    async fn download(&self, descriptor: &AttachmentDescriptor<'_>) -> Result<Vec<u8>, CourierError> {
        let media = descriptor.kind;
        let download_error = |message: String| CourierError::Download { media, message };

        let params = DownloadParams {
            kind: media,
            mimetype: descriptor.mime_type,
            media: descriptor.media,
        };
        let result = self
            .call("download", params)
            .await
            .map_err(|e| download_error(e.to_string()))?;
        let DownloadResult { data } = serde_json::from_value(result)
            .map_err(|e| download_error(format!("malformed download result: {e}")))?;
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| download_error(format!("invalid base64 payload: {e}")))
    }

    async fn decrypt_poll_vote(&self, message: &MessageEvent) -> Result<Value, CourierError> {
        self.call("decrypt_poll_vote", message).await
    }

    async fn decrypt_reaction(&self, message: &MessageEvent) -> Result<Value, CourierError> {
        self.call("decrypt_reaction", message).await
    }

    async fn disconnect(&self) -> Result<(), CourierError> {
        self.call("disconnect", json!({})).await?;
        info!("disconnected from protocol daemon");
        Ok(())
    }
}

struct Reader {
    writer: Arc<Mutex<OwnedWriteHalf>>,
    pending: Arc<Mutex<Pending>>,
    push_name: Arc<ArcSwapOption<String>>,
    approver: Arc<dyn PairingApprover>,
    event_tx: mpsc::UnboundedSender<InboundEvent>,
    qr_tx: mpsc::Sender<QrEvent>,
}

impl Reader {
    async fn run(self, read_half: OwnedReadHalf) {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if !line.trim().is_empty() {
                        self.handle_line(&line).await;
                    }
                }
                Ok(None) => {
                    info!("protocol daemon closed the connection");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read from protocol daemon");
                    break;
                }
            }
        }

        let mut pending = self.pending.lock().await;
        pending.closed = true;
        for (_, waiter) in pending.waiters.drain() {
            let _ = waiter.send(Err(CourierError::session("protocol daemon connection closed")));
        }
    }

    async fn handle_line(&self, line: &str) {
        let frame = match Frame::parse(line) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                warn!("ignoring frame with neither method nor id");
                return;
            }
            Err(e) => {
                warn!(error = %e, "ignoring malformed frame");
                return;
            }
        };

        match frame {
            Frame::Response { id, outcome } => {
                let waiter = self.pending.lock().await.waiters.remove(&id);
                match waiter {
                    Some(waiter) => {
                        let outcome = outcome.map_err(|e| CourierError::Session {
                            message: format!("daemon error {}: {}", e.code, e.message),
                            source: None,
                        });
                        let _ = waiter.send(outcome);
                    }
                    None => debug!(id, "response for unknown call"),
                }
            }
            Frame::Notification { method, params } => self.notification(&method, params).await,
            Frame::Request { id, method, params } => self.request(id, &method, params),
        }
    }

    async fn notification(&self, method: &str, params: Value) {
        match method {
            "event" => match serde_json::from_value::<InboundEvent>(params) {
                Ok(event) => {
                    let _ = self.event_tx.send(event);
                }
                Err(e) => warn!(error = %e, "ignoring event without a type"),
            },
            "session" => match serde_json::from_value::<SessionUpdate>(params) {
                Ok(update) => {
                    debug!(push_name = ?update.push_name, "session updated");
                    self.push_name.store(update.push_name.map(Arc::new));
                }
                Err(e) => warn!(error = %e, "ignoring malformed session update"),
            },
            "qr" => match serde_json::from_value::<QrEvent>(params) {
                Ok(qr) => {
                    if self.qr_tx.try_send(qr).is_err() {
                        debug!("QR item dropped; no reader or buffer full");
                    }
                }
                Err(e) => warn!(error = %e, "ignoring malformed QR item"),
            },
            other => debug!(method = other, "ignoring unknown notification"),
        }
    }

    /// Daemon-initiated requests are answered from a separate task so the
    /// approval window never stalls the read loop.
    fn request(&self, id: Value, method: &str, params: Value) {
        if method != "pair_request" {
            warn!(method, "ignoring unknown daemon request");
            return;
        }
        let request: PairingRequest = match serde_json::from_value(params) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "ignoring malformed pairing request");
                return;
            }
        };

        let approver = Arc::clone(&self.approver);
        let writer = Arc::clone(&self.writer);
        tokio::spawn(async move {
            let accepted = approver.approve(&request).await;
            let response = Response {
                jsonrpc: JSONRPC_VERSION,
                id: &id,
                result: Value::Bool(accepted),
            };
            let sent = match encode_line(&response) {
                Ok(line) => write_line(&writer, &line).await,
                Err(e) => Err(e),
            };
            if let Err(e) = sent {
                warn!(error = %e, "failed to answer pairing request");
            }
        });
    }
}

fn encode_line<T: Serialize>(frame: &T) -> Result<Vec<u8>, CourierError> {
    let mut line = serde_json::to_vec(frame)?;
    line.push(b'\n');
    Ok(line)
}

async fn write_line(writer: &Mutex<OwnedWriteHalf>, line: &[u8]) -> Result<(), CourierError> {
    let mut writer = writer.lock().await;
    writer.write_all(line).await.map_err(|e| CourierError::Session {
        message: format!("failed to write to protocol daemon: {e}"),
        source: Some(Box::new(e)),
    })?;
    writer.flush().await.map_err(|e| CourierError::Session {
        message: format!("failed to flush protocol daemon socket: {e}"),
        source: Some(Box::new(e)),
    })
}
