// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator approval for new device pairings.
//!
//! A pairing is accepted unless the operator rejects it within
//! [`APPROVAL_WINDOW`]. Decisions arrive through a single-slot channel that an
//! operator-facing reader (the console in the binary) pushes into.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, info};

use courier_core::{PairingApprover, PairingRequest};

/// How long the operator has to reject a pairing.
pub const APPROVAL_WINDOW: Duration = Duration::from_secs(3);

/// An operator's answer to a pending pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingDecision {
    Accept,
    Reject,
}

/// Holds the pending-pairing state: the number of waiting requests and the
/// decision slot.
pub struct PairingGate {
    waiting: AtomicUsize,
    decisions: mpsc::Sender<PairingDecision>,
    inbox: Mutex<mpsc::Receiver<PairingDecision>>,
    window: Duration,
}

/// Unregisters a waiting request however `approve` returns.
struct WaitingGuard<'a>(&'a AtomicUsize);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PairingGate {
    pub fn new() -> Self {
        let (decisions, inbox) = mpsc::channel(1);
        Self {
            waiting: AtomicUsize::new(0),
            decisions,
            inbox: Mutex::new(inbox),
            window: APPROVAL_WINDOW,
        }
    }

    /// True while a pairing request is waiting for a decision.
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst) > 0
    }

    /// A handle for delivering decisions into the single slot.
    pub fn decision_sender(&self) -> mpsc::Sender<PairingDecision> {
        self.decisions.clone()
    }

    /// Pushes a decision if a pairing is waiting and the slot is free.
    ///
    /// Returns whether the decision was queued.
    pub fn decide(&self, decision: PairingDecision) -> bool {
        self.is_waiting() && self.decisions.try_send(decision).is_ok()
    }

    /// Runs the approval race for one request.
    ///
    /// Every request gets its own window starting when it arrives. Requests
    /// that overlap share the decision slot, and a decision answers the oldest
    /// of them; the others are accepted when their own window closes.
    pub async fn request_approval(&self, request: &PairingRequest) -> bool {
        let deadline = Instant::now() + self.window;
        let first = self.waiting.fetch_add(1, Ordering::SeqCst) == 0;
        let _guard = WaitingGuard(&self.waiting);
        info!(
            jid = %request.jid,
            platform = %request.platform,
            business_name = %request.business_name,
            "pairing requested; type r within {} seconds to reject",
            self.window.as_secs()
        );

        let accepted = match tokio::time::timeout_at(deadline, self.inbox.lock()).await {
            Ok(mut inbox) => {
                // A decision typed between attempts must not answer this one.
                if first {
                    while inbox.try_recv().is_ok() {}
                }
                tokio::select! {
                    decision = inbox.recv() => decision != Some(PairingDecision::Reject),
                    () = tokio::time::sleep_until(deadline) => {
                        debug!("no pairing decision before the window closed");
                        true
                    }
                }
            }
            Err(_) => {
                debug!("window closed while an earlier pairing held the decision slot");
                true
            }
        };

        if accepted {
            info!(jid = %request.jid, "accepting pairing");
        } else {
            info!(jid = %request.jid, "rejecting pairing");
        }
        accepted
    }
}

impl Default for PairingGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PairingApprover for PairingGate {
    async fn approve(&self, request: &PairingRequest) -> bool {
        self.request_approval(request).await
    }
}
