// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound events as delivered by the protocol client.
//!
//! Events travel as a `{"type": ..., "payload": ...}` envelope. Known types are
//! decoded into [`Decoded`] views that expose only what the bridge inspects,
//! while the payload is kept exactly as received so that re-serializing an
//! event reproduces what the protocol client sent. Typed fields are lenient:
//! missing or null values take their defaults. A payload that still does not
//! fit its view, like any unrecognized type, survives as
//! [`InboundEvent::Unknown`].

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::types::{MediaKind, ReceiptKind};

/// App-state patch whose completed sync marks the session as ready.
pub const CRITICAL_BLOCK_PATCH: &str = "critical_block";

/// Unix seconds of `0001-01-01T00:00:00Z`, the protocol client's "never".
const ZERO_TIME_UNIX: i64 = -62_135_596_800;

static NULL: Value = Value::Null;

/// The wire form of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

/// A typed view over a payload, serialized back as the untouched payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    fields: T,
    raw: Value,
}

impl<T: DeserializeOwned> Decoded<T> {
    pub fn decode(raw: Value) -> Result<Self, serde_json::Error> {
        let fields = view(&raw)?;
        Ok(Self { fields, raw })
    }
}

impl<T> Decoded<T> {
    /// The payload as the protocol client sent it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl<T> Deref for Decoded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.fields
    }
}

impl<T> Serialize for Decoded<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Decoded<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(raw).map_err(serde::de::Error::custom)
    }
}

/// A null payload reads as an empty object.
fn view<T: DeserializeOwned>(raw: &Value) -> Result<T, serde_json::Error> {
    if raw.is_null() {
        T::deserialize(&Value::Object(Map::new()))
    } else {
        T::deserialize(raw)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub type AppStateSyncComplete = Decoded<AppStateSyncFields>;
pub type MessageEvent = Decoded<MessageFields>;
pub type ReceiptEvent = Decoded<ReceiptFields>;
pub type PresenceEvent = Decoded<PresenceFields>;
pub type HistorySyncEvent = Decoded<HistorySyncFields>;

/// One event emitted by the protocol client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "EventEnvelope")]
pub enum InboundEvent {
    AppStateSyncComplete(AppStateSyncComplete),
    Connected(Value),
    PushNameSetting(Value),
    StreamReplaced(Value),
    Message(MessageEvent),
    Receipt(ReceiptEvent),
    Presence(PresenceEvent),
    HistorySync(HistorySyncEvent),
    AppState(Value),
    KeepAliveTimeout(Value),
    KeepAliveRestored(Value),
    Blocklist(Value),
    Unknown(EventEnvelope),
}

impl InboundEvent {
    /// The wire type name of this event.
    pub fn kind(&self) -> &str {
        match self {
            Self::AppStateSyncComplete(_) => "AppStateSyncComplete",
            Self::Connected(_) => "Connected",
            Self::PushNameSetting(_) => "PushNameSetting",
            Self::StreamReplaced(_) => "StreamReplaced",
            Self::Message(_) => "Message",
            Self::Receipt(_) => "Receipt",
            Self::Presence(_) => "Presence",
            Self::HistorySync(_) => "HistorySync",
            Self::AppState(_) => "AppState",
            Self::KeepAliveTimeout(_) => "KeepAliveTimeout",
            Self::KeepAliveRestored(_) => "KeepAliveRestored",
            Self::Blocklist(_) => "Blocklist",
            Self::Unknown(envelope) => &envelope.kind,
        }
    }
}

impl From<EventEnvelope> for InboundEvent {
    fn from(envelope: EventEnvelope) -> Self {
        let EventEnvelope { kind, payload } = envelope;
        match kind.as_str() {
            "AppStateSyncComplete" => typed(kind, payload, Self::AppStateSyncComplete),
            "Connected" => Self::Connected(payload),
            "PushNameSetting" => Self::PushNameSetting(payload),
            "StreamReplaced" => Self::StreamReplaced(payload),
            "Message" => typed(kind, payload, Self::Message),
            "Receipt" => typed(kind, payload, Self::Receipt),
            "Presence" => typed(kind, payload, Self::Presence),
            "HistorySync" => typed(kind, payload, Self::HistorySync),
            "AppState" => Self::AppState(payload),
            "KeepAliveTimeout" => Self::KeepAliveTimeout(payload),
            "KeepAliveRestored" => Self::KeepAliveRestored(payload),
            "Blocklist" => Self::Blocklist(payload),
            _ => Self::Unknown(EventEnvelope { kind, payload }),
        }
    }
}

/// Wraps the typed view, or keeps the envelope as `Unknown` when the payload
/// does not fit it.
fn typed<T: DeserializeOwned>(
    kind: String,
    payload: Value,
    wrap: fn(Decoded<T>) -> InboundEvent,
) -> InboundEvent {
    match view(&payload) {
        Ok(fields) => wrap(Decoded { fields, raw: payload }),
        Err(_) => InboundEvent::Unknown(EventEnvelope { kind, payload }),
    }
}

impl Serialize for InboundEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, T: Serialize> {
            #[serde(rename = "type")]
            kind: &'a str,
            payload: &'a T,
        }

        let kind = self.kind();
        match self {
            Self::AppStateSyncComplete(payload) => Tagged { kind, payload }.serialize(serializer),
            Self::Message(payload) => Tagged { kind, payload }.serialize(serializer),
            Self::Receipt(payload) => Tagged { kind, payload }.serialize(serializer),
            Self::Presence(payload) => Tagged { kind, payload }.serialize(serializer),
            Self::HistorySync(payload) => Tagged { kind, payload }.serialize(serializer),
            Self::Connected(payload)
            | Self::PushNameSetting(payload)
            | Self::StreamReplaced(payload)
            | Self::AppState(payload)
            | Self::KeepAliveTimeout(payload)
            | Self::KeepAliveRestored(payload)
            | Self::Blocklist(payload) => Tagged { kind, payload }.serialize(serializer),
            Self::Unknown(envelope) => envelope.serialize(serializer),
        }
    }
}

/// An app-state patch finished syncing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppStateSyncFields {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl AppStateSyncFields {
    pub fn is_critical_block(&self) -> bool {
        self.name == CRITICAL_BLOCK_PATCH
    }
}

/// A chat message, with metadata and protobuf-style content.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageFields {
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: MessageInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: MessageContent,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_ephemeral: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_view_once: bool,
    #[serde(default, rename = "IsViewOnceV2", deserialize_with = "null_as_default")]
    pub is_view_once_v2: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_document_with_caption: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_edit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageInfo {
    #[serde(default, rename = "ID", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chat: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_group: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub push_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, rename = "Type", deserialize_with = "null_as_default")]
    pub message_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
}

impl MessageInfo {
    /// Human-readable origin, e.g. `alice in family-group`.
    pub fn source(&self) -> String {
        if self.is_group && !self.chat.is_empty() {
            format!("{} in {}", self.sender, self.chat)
        } else if self.sender.is_empty() {
            self.chat.clone()
        } else {
            self.sender.clone()
        }
    }
}

/// Message body. Only the sub-messages the bridge routes on are typed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    #[serde(default)]
    pub poll_update_message: Option<Value>,
    #[serde(default)]
    pub enc_reaction_message: Option<Value>,
    #[serde(default)]
    pub image_message: Option<MediaMessage>,
    #[serde(default)]
    pub audio_message: Option<MediaMessage>,
    #[serde(default)]
    pub video_message: Option<MediaMessage>,
    #[serde(default)]
    pub document_message: Option<MediaMessage>,
    #[serde(default)]
    pub sticker_message: Option<MediaMessage>,
    #[serde(default)]
    pub contact_message: Option<ContactMessage>,
}

/// A downloadable media message. Everything except the MIME type is the
/// opaque encrypted reference handed back to the protocol client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub vcard: Option<String>,
}

/// A reference to an attachment that must be fetched through the protocol client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentDescriptor<'a> {
    pub kind: MediaKind,
    pub mime_type: &'a str,
    pub media: &'a MediaMessage,
}

/// What a message carries, in routing priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attachment<'a> {
    Media(AttachmentDescriptor<'a>),
    /// vCard text embedded in the message; nothing to download.
    ContactCard { vcard: Option<&'a str> },
}

impl MessageContent {
    /// The first attachment found, checking image, audio, video, document,
    /// sticker, and contact card in that order.
    pub fn attachment(&self) -> Option<Attachment<'_>> {
        let media = [
            (MediaKind::Image, &self.image_message),
            (MediaKind::Audio, &self.audio_message),
            (MediaKind::Video, &self.video_message),
            (MediaKind::Document, &self.document_message),
            (MediaKind::Sticker, &self.sticker_message),
        ];
        for (kind, slot) in media {
            if let Some(media) = slot {
                return Some(Attachment::Media(AttachmentDescriptor {
                    kind,
                    mime_type: media.mimetype.as_deref().unwrap_or_default(),
                    media,
                }));
            }
        }

        self.contact_message.as_ref().map(|contact| Attachment::ContactCard {
            vcard: contact.vcard.as_deref(),
        })
    }
}

impl MessageFields {
    /// Comma-separated metadata used when logging a received message.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("pushname: {}", self.info.push_name),
            format!("timestamp: {}", self.info.timestamp),
        ];
        if !self.info.message_type.is_empty() {
            parts.push(format!("type: {}", self.info.message_type));
        }
        if !self.info.category.is_empty() {
            parts.push(format!("category: {}", self.info.category));
        }
        let flags = [
            (self.is_view_once, "view once"),
            (self.is_ephemeral, "ephemeral"),
            (self.is_view_once_v2, "ephemeral (v2)"),
            (self.is_document_with_caption, "document with caption"),
            (self.is_edit, "edit"),
        ];
        parts.extend(flags.iter().filter(|(set, _)| *set).map(|(_, name)| name.to_string()));
        parts.join(", ")
    }
}

/// Delivery or read receipt for one or more messages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptFields {
    /// Empty for plain delivery receipts.
    #[serde(default, rename = "Type", deserialize_with = "null_as_default")]
    pub receipt_type: String,
}

impl ReceiptFields {
    pub fn kind(&self) -> ReceiptKind {
        match self.receipt_type.as_str() {
            "" | "delivered" => ReceiptKind::Delivered,
            "read" => ReceiptKind::Read,
            "read-self" => ReceiptKind::ReadSelf,
            _ => ReceiptKind::Other,
        }
    }
}

/// A contact went online or offline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PresenceFields {
    #[serde(default, deserialize_with = "null_as_default")]
    pub unavailable: bool,
    /// RFC 3339 text; parsed on demand so the payload keeps its offset.
    #[serde(default)]
    pub last_seen: Option<String>,
}

impl PresenceFields {
    /// The last-seen time, unless absent, unparsable, or the zero time.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        let text = self.last_seen.as_deref()?;
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
            .filter(|ts| ts.timestamp() > ZERO_TIME_UNIX)
    }
}

/// Bulk transfer of past conversations. The history blob is read straight
/// from the payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistorySyncFields {}

impl HistorySyncEvent {
    /// The `Data` blob, or null when the payload has none.
    pub fn data(&self) -> &Value {
        self.raw.get("Data").unwrap_or(&NULL)
    }
}
