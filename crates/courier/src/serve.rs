// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` implementation.
//!
//! Wires the protocol session, the pairing gate, the dispatcher and the
//! record-store client together, then runs the event loop until the session
//! is superseded, the daemon goes away, or a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use courier_bridge::{Dispatcher, Flow, HistoryWriter, PairingGate};
use courier_config::CourierConfig;
use courier_core::{CourierError, InboundEvent, ProtocolClient};
use courier_pocketbase::PocketBaseClient;
use courier_session::RpcSession;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{console, qr, shutdown};

/// How long a graceful disconnect may take before exiting anyway.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Another session took over.
    Halted,
    /// A shutdown signal arrived.
    Cancelled,
    /// The protocol daemon closed the event stream.
    StreamEnded,
}

/// Runs the `serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.log.level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting courier");

    tokio::fs::create_dir_all(&config.history.path)
        .await
        .map_err(|e| CourierError::Persistence {
            path: config.history.path.clone(),
            source: Box::new(e),
        })?;

    let sink = Arc::new(PocketBaseClient::new(&config.record_store)?);
    info!(
        events = sink.events_url(),
        errors = sink.errors_url(),
        "record-store client ready"
    );

    let cancel = shutdown::install_signal_handler();
    let gate = Arc::new(PairingGate::new());
    console::spawn(Arc::clone(&gate));

    let (session, streams) = RpcSession::connect(&config.session.address, gate).await?;
    qr::spawn_printer(streams.qr);
    session.start(config.session.request_full_sync).await?;
    info!(
        request_full_sync = config.session.request_full_sync,
        "session started"
    );

    let dispatcher = Dispatcher::new(
        session.clone(),
        sink,
        HistoryWriter::new(&config.history.path),
    );

    match event_loop(&dispatcher, streams.events, &cancel).await {
        LoopExit::Halted => {
            warn!("session superseded by another instance, exiting");
            Ok(())
        }
        LoopExit::Cancelled => {
            info!("interrupt received, exiting");
            match tokio::time::timeout(DISCONNECT_TIMEOUT, session.disconnect()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "graceful disconnect failed"),
                Err(_) => warn!("protocol daemon did not acknowledge disconnect"),
            }
            Ok(())
        }
        LoopExit::StreamEnded => {
            error!("protocol daemon event stream ended");
            Err(CourierError::session("protocol daemon event stream ended"))
        }
    }
}

/// Handles events one at a time until something ends the loop.
///
/// A signal never interrupts an event that is already being handled.
pub async fn event_loop(
    dispatcher: &Dispatcher,
    mut events: mpsc::UnboundedReceiver<InboundEvent>,
    cancel: &CancellationToken,
) -> LoopExit {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return LoopExit::Cancelled,
            next = events.recv() => next,
        };
        let Some(event) = next else {
            return LoopExit::StreamEnded;
        };
        if dispatcher.handle(&event).await == Flow::Halt {
            return LoopExit::Halted;
        }
    }
}

/// Initialize tracing subscriber with the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
