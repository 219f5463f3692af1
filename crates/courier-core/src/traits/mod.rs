// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams to the two external collaborators and the operator.
//!
//! All traits use `#[async_trait]` so they can be held as trait objects.

pub mod pairing;
pub mod protocol;
pub mod sink;

pub use pairing::PairingApprover;
pub use protocol::ProtocolClient;
pub use sink::RecordSink;
