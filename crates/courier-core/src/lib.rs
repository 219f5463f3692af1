// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier bridge.
//!
//! This crate provides the event model, the shared error type, and the traits
//! behind which the protocol client, the record-store, and the pairing operator
//! sit. Every other crate in the workspace builds on these definitions.

pub mod error;
pub mod event;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use event::{
    Attachment, AttachmentDescriptor, Decoded, EventEnvelope, InboundEvent, MediaMessage,
    MessageEvent,
};
pub use types::{EventLabel, MediaKind, PairingRequest, Presence, ReceiptKind, ResolvedFile};

pub use traits::{PairingApprover, ProtocolClient, RecordSink};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn event_labels_round_trip_through_strings() {
        for label in EventLabel::iter() {
            let s = label.to_string();
            assert!(!s.is_empty());
            assert_eq!(EventLabel::from_str(&s).expect("should parse back"), label);
        }
    }

    #[test]
    fn media_labels_use_record_store_names() {
        assert_eq!(
            EventLabel::for_media(MediaKind::Image).to_string(),
            "Message.GetImageMessage"
        );
        assert_eq!(
            EventLabel::for_media(MediaKind::Contact).to_string(),
            "Message.GetContactMessage"
        );
        assert_eq!(
            serde_json::to_value(EventLabel::UnknownEvent).unwrap(),
            serde_json::json!("UnknownEvent")
        );
    }

    #[test]
    fn download_error_names_the_media() {
        let err = CourierError::Download {
            media: MediaKind::Sticker,
            message: "media expired".into(),
        };
        assert_eq!(err.to_string(), "failed to download sticker: media expired");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _protocol(_: &dyn ProtocolClient) {}
        fn _sink(_: &dyn RecordSink) {}
        fn _approver(_: &dyn PairingApprover) {}
    }
}
