// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure event classification.
//!
//! [`classify`] looks at one event and the session state and decides what the
//! dispatcher must do with it. It performs no I/O, so every routing rule can
//! be tested without a protocol client or a record-store.

use serde_json::Value;

use courier_core::{
    Attachment, AttachmentDescriptor, EventLabel, InboundEvent, MessageEvent, ReceiptKind,
};

/// The parts of session state that influence classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionView {
    /// Whether the account's own display name is known yet.
    pub push_name_known: bool,
}

/// What to do with one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<'a> {
    /// Forward the raw event under `label`, with no extra payload.
    Forward(EventLabel),
    /// Announce "available" presence, then forward under `label`.
    AnnouncePresence(EventLabel),
    /// Another session took over: report it and stop.
    Supersede,
    DecryptPollVote(&'a MessageEvent),
    DecryptReaction(&'a MessageEvent),
    /// Download the attachment and forward it as a file.
    Attachment {
        label: EventLabel,
        descriptor: AttachmentDescriptor<'a>,
        event_id: &'a str,
    },
    /// Forward the embedded vCard as a file.
    ContactCard {
        vcard: Option<&'a str>,
        event_id: &'a str,
    },
    /// Snapshot the payload locally, then forward.
    PersistHistory(&'a Value),
    /// Intentionally not forwarded.
    Drop,
}

/// Decides how `event` is handled.
pub fn classify<'a>(event: &'a InboundEvent, session: SessionView) -> Action<'a> {
    match event {
        InboundEvent::AppStateSyncComplete(sync) => {
            if session.push_name_known && sync.is_critical_block() {
                Action::AnnouncePresence(EventLabel::AppStateSyncComplete)
            } else {
                Action::Forward(EventLabel::AppStateSyncComplete)
            }
        }
        InboundEvent::Connected(_) | InboundEvent::PushNameSetting(_) => {
            if session.push_name_known {
                Action::AnnouncePresence(EventLabel::Connected)
            } else {
                Action::Forward(EventLabel::Connected)
            }
        }
        InboundEvent::StreamReplaced(_) => Action::Supersede,
        InboundEvent::Message(message) => classify_message(message),
        InboundEvent::Receipt(receipt) => match receipt.kind() {
            ReceiptKind::Read => Action::Forward(EventLabel::ReceiptRead),
            ReceiptKind::ReadSelf => Action::Forward(EventLabel::ReceiptReadSelf),
            ReceiptKind::Delivered => Action::Forward(EventLabel::ReceiptDelivered),
            ReceiptKind::Other => Action::Drop,
        },
        InboundEvent::Presence(presence) => {
            let label = if !presence.unavailable {
                EventLabel::PresenceOnline
            } else if presence.last_seen().is_some() {
                EventLabel::PresenceOfflineLastSeen
            } else {
                EventLabel::PresenceOffline
            };
            Action::Forward(label)
        }
        InboundEvent::HistorySync(sync) => Action::PersistHistory(sync.data()),
        InboundEvent::AppState(_) => Action::Forward(EventLabel::AppState),
        InboundEvent::KeepAliveTimeout(_) => Action::Forward(EventLabel::KeepAliveTimeout),
        InboundEvent::KeepAliveRestored(_) => Action::Forward(EventLabel::KeepAliveRestored),
        InboundEvent::Blocklist(_) => Action::Forward(EventLabel::Blocklist),
        InboundEvent::Unknown(_) => Action::Forward(EventLabel::UnknownEvent),
    }
}

fn classify_message(message: &MessageEvent) -> Action<'_> {
    let content = &message.message;
    if content.poll_update_message.is_some() {
        return Action::DecryptPollVote(message);
    }
    if content.enc_reaction_message.is_some() {
        return Action::DecryptReaction(message);
    }

    let event_id = message.info.id.as_str();
    match content.attachment() {
        Some(Attachment::Media(descriptor)) => Action::Attachment {
            label: EventLabel::for_media(descriptor.kind),
            descriptor,
            event_id,
        },
        Some(Attachment::ContactCard { vcard }) => Action::ContactCard { vcard, event_id },
        None => Action::Forward(EventLabel::Message),
    }
}
