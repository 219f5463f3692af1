// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator console: typing `r` while a pairing waits rejects it.
//!
//! Stdin is read on a plain thread rather than through the runtime. A read
//! blocked on an idle terminal cannot be cancelled, and the runtime waits for
//! its blocking pool on shutdown; a detached thread ends with the process.

use std::io::BufRead;
use std::sync::Arc;

use tracing::{debug, info, warn};

use courier_bridge::{PairingDecision, PairingGate};

/// Reads operator input from stdin until end of input or process exit.
pub fn spawn(gate: Arc<PairingGate>) {
    let spawned = std::thread::Builder::new()
        .name("courier-console".into())
        .spawn(move || run(std::io::stdin().lock(), &gate));
    if let Err(e) = spawned {
        warn!(error = %e, "operator console unavailable; pairings will be accepted");
    }
}

fn run<R: BufRead>(input: R, gate: &PairingGate) {
    for line in input.lines() {
        match line {
            Ok(line) => handle_line(&line, gate),
            Err(e) => {
                debug!(error = %e, "operator console unreadable");
                return;
            }
        }
    }
    debug!("operator console closed");
}

fn handle_line(line: &str, gate: &PairingGate) {
    if !line.trim().eq_ignore_ascii_case("r") {
        return;
    }
    if gate.decide(PairingDecision::Reject) {
        info!("pairing rejection queued");
    } else {
        debug!("ignoring reject: no pairing is waiting");
    }
}
