// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protocol client adapter for the Courier bridge.
//!
//! Courier does not speak the messaging protocol itself. A separate protocol
//! daemon holds the authenticated session; this crate drives it over
//! newline-delimited JSON-RPC 2.0 on a TCP socket and exposes it as a
//! [`ProtocolClient`](courier_core::ProtocolClient).

pub mod client;
pub mod rpc;

pub use client::{RpcSession, SessionStreams};
pub use rpc::QrEvent;
