// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Approval hook for new device pairings.

use async_trait::async_trait;

use crate::types::PairingRequest;

/// Decides whether a device may be linked to the account.
#[async_trait]
pub trait PairingApprover: Send + Sync + 'static {
    /// Returns `true` to accept the pairing.
    async fn approve(&self, request: &PairingRequest) -> bool;
}
