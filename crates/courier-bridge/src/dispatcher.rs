// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executes the action chosen by [`classify`] for each inbound event.
//!
//! Every step is attempted once. A failed step becomes an error record sent to
//! the record-store; a failed error record is logged and dropped. The only
//! outcome that stops the bridge is a superseded session.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use courier_core::{
    AttachmentDescriptor, CourierError, EventLabel, InboundEvent, MessageEvent, Presence,
    ProtocolClient, RecordSink,
};

use crate::attachment;
use crate::classify::{classify, Action, SessionView};
use crate::history::HistoryWriter;

/// Whether the event loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The session was taken over elsewhere; process no further events.
    Halt,
}

pub struct Dispatcher {
    client: Arc<dyn ProtocolClient>,
    sink: Arc<dyn RecordSink>,
    history: HistoryWriter,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn ProtocolClient>,
        sink: Arc<dyn RecordSink>,
        history: HistoryWriter,
    ) -> Self {
        Self {
            client,
            sink,
            history,
        }
    }

    pub fn history(&self) -> &HistoryWriter {
        &self.history
    }

    /// Handles one event to completion.
    pub async fn handle(&self, event: &InboundEvent) -> Flow {
        if let InboundEvent::Message(message) = event {
            info!(
                event_id = %message.info.id,
                source = %message.info.source(),
                "received message ({})",
                message.summary()
            );
        }

        let session = SessionView {
            push_name_known: self.client.push_name().is_some_and(|name| !name.is_empty()),
        };
        let action = classify(event, session);
        debug!(kind = event.kind(), ?session, "event classified");

        match action {
            Action::Forward(label) => self.forward(label, event, None).await,
            Action::AnnouncePresence(label) => self.announce_presence(label, event).await,
            Action::Supersede => {
                warn!("stream replaced by another session; halting");
                self.report(EventLabel::StreamReplaced, "Stream replaced", event)
                    .await;
                return Flow::Halt;
            }
            Action::DecryptPollVote(message) => self.poll_vote(message, event).await,
            Action::DecryptReaction(message) => self.reaction(message, event).await,
            Action::Attachment {
                label,
                descriptor,
                event_id,
            } => self.attachment(label, &descriptor, event_id, event).await,
            Action::ContactCard { vcard, event_id } => {
                self.contact_card(vcard, event_id, event).await
            }
            Action::PersistHistory(data) => self.persist_history(data, event).await,
            Action::Drop => debug!(kind = event.kind(), "event dropped by filter"),
        }
        Flow::Continue
    }

    async fn forward(&self, label: EventLabel, event: &InboundEvent, extra: Option<&Value>) {
        match self.sink.post_event(label, event, extra).await {
            Ok(()) => debug!(label = %label, "event forwarded"),
            Err(e) => {
                warn!(label = %label, error = %e, "failed to forward event");
                self.report(label, "Failed to forward event", event).await;
            }
        }
    }

    /// Sends an error record. There is no fallback if this fails too.
    async fn report(&self, label: EventLabel, reason: &str, event: &InboundEvent) {
        if let Err(e) = self.sink.post_error(label, reason, event).await {
            error!(
                label = %label,
                reason,
                error = %e,
                status = ?e.status(),
                "failed to post error record"
            );
        }
    }

    async fn announce_presence(&self, label: EventLabel, event: &InboundEvent) {
        match self.client.send_presence(Presence::Available).await {
            Ok(()) => {
                info!("marked self as available");
                self.forward(label, event, None).await;
            }
            Err(e) => {
                warn!(error = %e, "failed to send available presence");
                self.report(label, "Failed to send presence", event).await;
            }
        }
    }

    async fn poll_vote(&self, message: &MessageEvent, event: &InboundEvent) {
        match self.client.decrypt_poll_vote(message).await {
            Ok(vote) => self.forward(EventLabel::PollVote, event, Some(&vote)).await,
            Err(e) => {
                warn!(event_id = %message.info.id, error = %e, "failed to decrypt vote");
                self.report(EventLabel::PollVote, "Failed to decrypt vote", event)
                    .await;
            }
        }
    }

    async fn reaction(&self, message: &MessageEvent, event: &InboundEvent) {
        match self.client.decrypt_reaction(message).await {
            Ok(reaction) => {
                self.forward(EventLabel::Reaction, event, Some(&reaction))
                    .await
            }
            Err(e) => {
                warn!(event_id = %message.info.id, error = %e, "failed to decrypt reaction");
                self.report(
                    EventLabel::Reaction,
                    "Failed to decrypt encrypted reaction",
                    event,
                )
                .await;
            }
        }
    }

    async fn attachment(
        &self,
        label: EventLabel,
        descriptor: &AttachmentDescriptor<'_>,
        event_id: &str,
        event: &InboundEvent,
    ) {
        let media = descriptor.kind;
        let file = match attachment::resolve(self.client.as_ref(), descriptor, event_id).await {
            Ok(file) => file,
            Err(e) => {
                warn!(event_id, error = %e, "attachment download failed");
                self.report(label, &format!("Failed to download {media}"), event)
                    .await;
                return;
            }
        };

        if let Err(e) = self.sink.post_event_file(label, event, None, &file).await {
            warn!(event_id, file_name = %file.file_name, error = %e, "attachment upload failed");
            self.report(label, &format!("Failed to save {media}"), event)
                .await;
        }
    }

    async fn contact_card(&self, vcard: Option<&str>, event_id: &str, event: &InboundEvent) {
        let label = EventLabel::Contact;
        let result = match vcard {
            Some(vcard) => {
                let file = attachment::contact_card(event_id, vcard);
                self.sink.post_event_file(label, event, None, &file).await
            }
            None => Err(CourierError::Internal("contact message has no vCard".into())),
        };

        if let Err(e) = result {
            warn!(event_id, error = %e, "contact card upload failed");
            self.report(label, "Failed to save contact", event).await;
        }
    }

    async fn persist_history(&self, data: &Value, event: &InboundEvent) {
        match self.history.persist(data).await {
            Ok(path) => {
                info!(path = %path.display(), "history sync saved");
                self.forward(EventLabel::HistorySync, event, None).await;
            }
            Err(e) => {
                warn!(error = %e, "failed to save history sync");
                let reason = match e {
                    CourierError::Encode(_) => "Failed to encode JSON",
                    _ => "Failed to write history file",
                };
                self.report(EventLabel::HistorySync, reason, event).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use courier_core::MediaKind;
    use courier_test_utils::{event, MockProtocolClient, Posted, ProtocolCall, RecordingSink};
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    struct Harness {
        client: Arc<MockProtocolClient>,
        sink: Arc<RecordingSink>,
        dispatcher: Dispatcher,
        _dir: tempfile::TempDir,
    }

    fn harness(client: MockProtocolClient) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(client);
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = Dispatcher::new(
            client.clone(),
            sink.clone(),
            HistoryWriter::with_start_time(dir.path(), 1_700_000_000),
        );
        Harness {
            client,
            sink,
            dispatcher,
            _dir: dir,
        }
    }

    fn message(content: Value) -> InboundEvent {
        event(json!({
            "type": "Message",
            "payload": {"Info": {"ID": "M1", "PushName": "Alice"}, "Message": content}
        }))
    }

    #[tokio::test]
    async fn connected_without_push_name_skips_presence() {
        let h = harness(MockProtocolClient::new());
        let flow = h
            .dispatcher
            .handle(&event(json!({"type": "Connected", "payload": {}})))
            .await;

        assert_eq!(flow, Flow::Continue);
        assert!(h.client.calls().await.is_empty());
        assert_eq!(h.sink.labels().await, vec![EventLabel::Connected]);
    }

    #[tokio::test]
    async fn connected_with_push_name_announces_presence_first() {
        let h = harness(MockProtocolClient::new().with_push_name("Courier"));
        h.dispatcher
            .handle(&event(json!({"type": "Connected", "payload": {}})))
            .await;

        assert_eq!(
            h.client.calls().await,
            vec![ProtocolCall::SendPresence(Presence::Available)]
        );
        assert!(matches!(
            &h.sink.posted().await[..],
            [Posted::Event { label: EventLabel::Connected, extra: None, .. }]
        ));
    }

    #[tokio::test]
    async fn presence_failure_replaces_the_forward() {
        let h = harness(
            MockProtocolClient::new()
                .with_push_name("Courier")
                .failing_presence(),
        );
        h.dispatcher
            .handle(&event(json!({
                "type": "AppStateSyncComplete",
                "payload": {"Name": "critical_block"}
            })))
            .await;

        let posted = h.sink.posted().await;
        assert_eq!(posted.len(), 1);
        assert!(posted[0].is_error());
        assert_eq!(posted[0].label(), EventLabel::AppStateSyncComplete);
        assert_eq!(h.sink.error_reasons().await, vec!["Failed to send presence"]);
    }

    #[tokio::test]
    async fn stream_replaced_reports_and_halts() {
        let h = harness(MockProtocolClient::new());
        let flow = h
            .dispatcher
            .handle(&event(json!({"type": "StreamReplaced", "payload": {}})))
            .await;

        assert_eq!(flow, Flow::Halt);
        assert_eq!(h.sink.error_reasons().await, vec!["Stream replaced"]);
    }

    #[tokio::test]
    async fn stream_replaced_halts_even_if_the_report_fails() {
        let h = harness(MockProtocolClient::new());
        h.sink.fail_errors(true);
        let flow = h
            .dispatcher
            .handle(&event(json!({"type": "StreamReplaced", "payload": {}})))
            .await;
        assert_eq!(flow, Flow::Halt);
    }

    #[tokio::test]
    async fn decrypted_vote_is_sent_as_extra() {
        let vote = json!({"selectedOptions": ["b64hash"]});
        let h = harness(MockProtocolClient::new().with_poll_vote(vote.clone()));
        h.dispatcher
            .handle(&message(json!({"pollUpdateMessage": {}})))
            .await;

        match &h.sink.posted().await[..] {
            [Posted::Event { label, extra, .. }] => {
                assert_eq!(*label, EventLabel::PollVote);
                assert_eq!(extra.as_ref(), Some(&vote));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn decrypt_failures_become_error_records() {
        let h = harness(MockProtocolClient::new());
        h.dispatcher
            .handle(&message(json!({"pollUpdateMessage": {}})))
            .await;
        h.dispatcher
            .handle(&message(json!({"encReactionMessage": {}})))
            .await;

        assert_eq!(
            h.sink.error_reasons().await,
            vec!["Failed to decrypt vote", "Failed to decrypt encrypted reaction"]
        );
        assert_eq!(
            h.sink.labels().await,
            vec![EventLabel::PollVote, EventLabel::Reaction]
        );
    }

    #[tokio::test]
    async fn image_is_uploaded_with_derived_name() {
        let h = harness(MockProtocolClient::new().with_download(b"jpeg"));
        h.dispatcher
            .handle(&message(json!({"imageMessage": {"mimetype": "image/jpeg"}})))
            .await;

        match &h.sink.posted().await[..] {
            [Posted::File { label, file, extra, .. }] => {
                assert_eq!(*label, EventLabel::Image);
                assert_eq!(file.file_name, "M1.jpg");
                assert_eq!(file.bytes, b"jpeg");
                assert_eq!(*extra, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn download_failure_stops_without_plain_forward() {
        let h = harness(MockProtocolClient::new().failing_download("gone"));
        h.dispatcher
            .handle(&message(json!({"audioMessage": {"mimetype": "audio/ogg"}})))
            .await;

        let posted = h.sink.posted().await;
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].label(), EventLabel::Audio);
        assert_eq!(h.sink.error_reasons().await, vec!["Failed to download audio"]);
        assert_eq!(
            h.client.calls().await,
            vec![ProtocolCall::Download {
                kind: MediaKind::Audio,
                mime_type: "audio/ogg".into()
            }]
        );
    }

    #[tokio::test]
    async fn upload_failure_reports_save_error() {
        let h = harness(MockProtocolClient::new());
        h.sink.fail_events(true);
        h.dispatcher
            .handle(&message(json!({"videoMessage": {"mimetype": "video/mp4"}})))
            .await;

        assert_eq!(h.sink.error_reasons().await, vec!["Failed to save video"]);
    }

    #[tokio::test]
    async fn contact_without_vcard_is_an_error() {
        let h = harness(MockProtocolClient::new());
        h.dispatcher
            .handle(&message(json!({"contactMessage": {"displayName": "Bob"}})))
            .await;

        assert_eq!(h.sink.error_reasons().await, vec!["Failed to save contact"]);
        assert_eq!(h.sink.labels().await, vec![EventLabel::Contact]);
    }

    #[tokio::test]
    async fn contact_card_is_uploaded_as_vcf() {
        let h = harness(MockProtocolClient::new());
        h.dispatcher
            .handle(&message(json!({"contactMessage": {"vcard": "BEGIN:VCARD"}})))
            .await;

        match &h.sink.posted().await[..] {
            [Posted::File { label, file, .. }] => {
                assert_eq!(*label, EventLabel::Contact);
                assert_eq!(file.file_name, "M1.vcf");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(h.client.calls().await.is_empty());
    }

    #[tokio::test]
    async fn forward_failure_falls_back_to_error_record() {
        let h = harness(MockProtocolClient::new());
        h.sink.fail_events(true);
        h.dispatcher
            .handle(&event(json!({"type": "Blocklist", "payload": {}})))
            .await;

        let posted = h.sink.posted().await;
        assert_eq!(posted.len(), 2);
        assert!(!posted[0].is_error());
        assert!(posted[1].is_error());
        assert_eq!(h.sink.error_reasons().await, vec!["Failed to forward event"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_error_record_is_only_logged() {
        let h = harness(MockProtocolClient::new());
        h.sink.fail_events(true);
        h.sink.fail_errors(true);
        let flow = h
            .dispatcher
            .handle(&event(json!({"type": "AppState", "payload": {}})))
            .await;

        assert_eq!(flow, Flow::Continue);
        assert_eq!(h.sink.count().await, 2);
        assert!(logs_contain("failed to post error record"));
    }

    #[tokio::test]
    async fn filtered_receipt_produces_no_calls() {
        let h = harness(MockProtocolClient::new());
        h.dispatcher
            .handle(&event(json!({"type": "Receipt", "payload": {"Type": "played"}})))
            .await;

        assert_eq!(h.sink.count().await, 0);
        assert!(h.client.calls().await.is_empty());
    }

    #[tokio::test]
    async fn history_sync_is_saved_then_forwarded() {
        let h = harness(MockProtocolClient::new());
        h.dispatcher
            .handle(&event(json!({"type": "HistorySync", "payload": {"Data": {"n": 1}}})))
            .await;

        let path = h.dispatcher.history().path_for(1);
        let saved: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved, json!({"n": 1}));
        assert_eq!(h.sink.labels().await, vec![EventLabel::HistorySync]);
        assert_eq!(h.sink.error_reasons().await, Vec::<String>::new());
    }

    #[tokio::test]
    async fn unknown_event_is_forwarded_once() {
        let h = harness(MockProtocolClient::new());
        let raw = json!({"type": "CallOffer", "payload": {"CallID": "c1"}});
        h.dispatcher.handle(&event(raw.clone())).await;

        match &h.sink.posted().await[..] {
            [Posted::Event { label, raw: posted, .. }] => {
                assert_eq!(*label, EventLabel::UnknownEvent);
                assert_eq!(*posted, raw);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
