// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record-store delivery for the Courier bridge.
//!
//! Provides [`PocketBaseClient`], the [`RecordSink`](courier_core::RecordSink)
//! used in production. Plain events are posted as JSON; events carrying an
//! attachment are posted as `multipart/form-data`.

pub mod client;

pub use client::PocketBaseClient;
