// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Labels, media kinds, and small value types shared across the bridge.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Classification label attached to every record sent to the record-store.
///
/// The string forms are part of the record-store contract; downstream
/// collections filter on them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum EventLabel {
    AppStateSyncComplete,
    Connected,
    StreamReplaced,
    #[strum(serialize = "Message.GetPollUpdateMessage")]
    PollVote,
    #[strum(serialize = "Message.GetEncReactionMessage")]
    Reaction,
    #[strum(serialize = "Message.GetImageMessage")]
    Image,
    #[strum(serialize = "Message.GetAudioMessage")]
    Audio,
    #[strum(serialize = "Message.GetVideoMessage")]
    Video,
    #[strum(serialize = "Message.GetDocumentMessage")]
    Document,
    #[strum(serialize = "Message.GetStickerMessage")]
    Sticker,
    #[strum(serialize = "Message.GetContactMessage")]
    Contact,
    Message,
    ReceiptRead,
    ReceiptReadSelf,
    ReceiptDelivered,
    PresenceOffline,
    PresenceOfflineLastSeen,
    PresenceOnline,
    HistorySync,
    AppState,
    KeepAliveTimeout,
    KeepAliveRestored,
    Blocklist,
    UnknownEvent,
}

impl EventLabel {
    /// The label used when forwarding an attachment of the given kind.
    pub fn for_media(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => Self::Image,
            MediaKind::Audio => Self::Audio,
            MediaKind::Video => Self::Video,
            MediaKind::Document => Self::Document,
            MediaKind::Sticker => Self::Sticker,
            MediaKind::Contact => Self::Contact,
        }
    }
}

impl Serialize for EventLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

/// The kind of binary content a message carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
    Sticker,
    Contact,
}

/// Presence state announced by the protocol client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Available,
    Unavailable,
}

/// Sub-classification of a receipt event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    Delivered,
    Read,
    ReadSelf,
    /// Played, sender, retry, server-error and anything newer.
    Other,
}

/// A decrypted attachment ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A pairing attempt awaiting operator approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRequest {
    /// Account identity of the device being linked.
    pub jid: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub business_name: String,
}
