// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Courier event pipeline.
//!
//! Events flow from the protocol client into the [`Dispatcher`], which
//! classifies them, runs any side effects (presence, attachment download,
//! history snapshot) and forwards the result to a record sink. The
//! [`PairingGate`] answers pairing requests independently of the pipeline.

pub mod attachment;
pub mod classify;
pub mod dispatcher;
pub mod history;
pub mod pairing;

pub use classify::{classify, Action, SessionView};
pub use dispatcher::{Dispatcher, Flow};
pub use history::HistoryWriter;
pub use pairing::{PairingDecision, PairingGate, APPROVAL_WINDOW};
