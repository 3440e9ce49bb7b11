//! Event dispatch: route decoded webhook events to handlers and send replies.
//!
//! The dispatcher is constructed once at startup and holds its collaborators
//! behind trait objects (reply delivery, knowledge search) plus an optional
//! store. Events in a batch are processed sequentially, in array order; a
//! failure in one event is logged and never aborts the rest.

use crate::intent;
use crate::knowledge::{self, KnowledgeSearch};
use crate::line::{EventKind, InboundEvent, MessageContent, MessageKind, ReplySender};
use crate::replies;
use crate::store::{NewCustomer, Store};
use std::sync::Arc;

pub struct Dispatcher {
    sender: Arc<dyn ReplySender>,
    knowledge: Arc<dyn KnowledgeSearch>,
    store: Option<Arc<Store>>,
}

impl Dispatcher {
    pub fn new(
        sender: Arc<dyn ReplySender>,
        knowledge: Arc<dyn KnowledgeSearch>,
        store: Option<Arc<Store>>,
    ) -> Self {
        Self {
            sender,
            knowledge,
            store,
        }
    }

    /// Process every event in the batch, in order. Per-event failures are
    /// logged with context and do not affect sibling events.
    pub async fn dispatch(&self, events: Vec<InboundEvent>) {
        for event in events {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&self, event: InboundEvent) {
        match &event.kind {
            EventKind::Message(content) => {
                let content = content.clone();
                self.handle_message(&event, content).await;
            }
            EventKind::Follow => self.handle_follow(&event).await,
            EventKind::Unfollow => {
                log::info!("user unfollowed: {}", event.source_user_id);
            }
            EventKind::Other(kind) => {
                log::info!("unhandled event type '{}' from {}", kind, event.source_user_id);
            }
        }
    }

    async fn handle_message(&self, event: &InboundEvent, content: MessageContent) {
        log::info!(
            "processing message from {}: kind={:?}",
            event.source_user_id,
            content.kind
        );
        self.log_message(&event.source_user_id, &content).await;

        let reply = match content.kind {
            MessageKind::Text => {
                let text = content.text.as_deref().unwrap_or("");
                self.reply_for_text(text).await
            }
            MessageKind::Image => replies::IMAGE_ONLY_TEXT.to_string(),
            MessageKind::Other(_) => replies::UNSUPPORTED_TYPE.to_string(),
        };
        self.send_reply(event, &reply).await;
    }

    /// Template for a matched intent, knowledge search otherwise.
    async fn reply_for_text(&self, text: &str) -> String {
        let intent = intent::classify(text);
        match replies::for_intent(intent) {
            Some(template) => template.to_string(),
            None => knowledge::search_and_format(self.knowledge.as_ref(), text).await,
        }
    }

    async fn handle_follow(&self, event: &InboundEvent) {
        log::info!("user followed: {}", event.source_user_id);
        self.ensure_customer(&event.source_user_id).await;
        self.send_reply(event, replies::WELCOME).await;
    }

    /// Create a customer row for a new follower if one does not exist.
    /// Store failures degrade to a log line.
    async fn ensure_customer(&self, line_user_id: &str) {
        let Some(ref store) = self.store else { return };
        match store.customer_by_line_user_id(line_user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let customer = NewCustomer {
                    name: String::new(),
                    phone: String::new(),
                    address: String::new(),
                    customer_type: "line".to_string(),
                    line_user_id: line_user_id.to_string(),
                };
                if let Err(e) = store.create_customer(&customer).await {
                    log::warn!("creating customer for {} failed: {}", line_user_id, e);
                }
            }
            Err(e) => log::warn!("customer lookup for {} failed: {}", line_user_id, e),
        }
    }

    async fn log_message(&self, user_id: &str, content: &MessageContent) {
        let Some(ref store) = self.store else { return };
        let message_type = match &content.kind {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Other(kind) => kind.as_str(),
        };
        let text = content.text.as_deref().unwrap_or("");
        if let Err(e) = store.log_message(user_id, message_type, text).await {
            log::warn!("logging message from {} failed: {}", user_id, e);
        }
    }

    async fn send_reply(&self, event: &InboundEvent, text: &str) {
        if let Err(e) = self.sender.send(&event.reply_token, text).await {
            log::warn!(
                "sending reply to {} ({} event) failed: {}",
                event.source_user_id,
                event.kind.name(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{KnowledgeError, SearchResult};
    use crate::line::{DeliveryError, SourceKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ReplySender for RecordingSender {
        async fn send(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .unwrap()
                .push((reply_token.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct FailingSender;

    #[async_trait]
    impl ReplySender for FailingSender {
        async fn send(&self, _reply_token: &str, _text: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError::Api("400 bad token".to_string()))
        }
    }

    struct StubKnowledge(Result<Vec<SearchResult>, ()>);

    #[async_trait]
    impl KnowledgeSearch for StubKnowledge {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, KnowledgeError> {
            match &self.0 {
                Ok(results) => Ok(results.clone()),
                Err(()) => Err(KnowledgeError::Api("down".to_string())),
            }
        }
    }

    fn dispatcher(sender: Arc<dyn ReplySender>, knowledge: StubKnowledge) -> Dispatcher {
        Dispatcher::new(sender, Arc::new(knowledge), None)
    }

    fn text_event(token: &str, text: &str) -> InboundEvent {
        InboundEvent {
            kind: EventKind::Message(MessageContent {
                kind: MessageKind::Text,
                id: "m1".to_string(),
                text: Some(text.to_string()),
            }),
            source_user_id: "U1".to_string(),
            source_kind: SourceKind::User,
            reply_token: token.to_string(),
        }
    }

    fn event_of(kind: EventKind) -> InboundEvent {
        InboundEvent {
            kind,
            source_user_id: "U1".to_string(),
            source_kind: SourceKind::User,
            reply_token: "rt".to_string(),
        }
    }

    #[tokio::test]
    async fn follow_sends_welcome() {
        let sender = Arc::new(RecordingSender::default());
        let d = dispatcher(sender.clone(), StubKnowledge(Ok(Vec::new())));
        d.dispatch(vec![event_of(EventKind::Follow)]).await;
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, replies::WELCOME);
    }

    #[tokio::test]
    async fn unfollow_and_unknown_send_nothing() {
        let sender = Arc::new(RecordingSender::default());
        let d = dispatcher(sender.clone(), StubKnowledge(Ok(Vec::new())));
        d.dispatch(vec![
            event_of(EventKind::Unfollow),
            event_of(EventKind::Other("memberJoined".to_string())),
        ])
        .await;
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn price_text_sends_price_template() {
        let sender = Arc::new(RecordingSender::default());
        let d = dispatcher(sender.clone(), StubKnowledge(Ok(Vec::new())));
        d.dispatch(vec![text_event("rt1", "價格")]).await;
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].0, "rt1");
        assert!(sent[0].1.starts_with("🔥 瓦斯價格表 🔥"));
    }

    #[tokio::test]
    async fn greeting_text_sends_greeting() {
        let sender = Arc::new(RecordingSender::default());
        let d = dispatcher(sender.clone(), StubKnowledge(Ok(Vec::new())));
        d.dispatch(vec![text_event("rt1", "hi")]).await;
        assert_eq!(sender.sent.lock().unwrap()[0].1, replies::GREETING);
    }

    #[tokio::test]
    async fn image_message_sends_image_notice() {
        let sender = Arc::new(RecordingSender::default());
        let d = dispatcher(sender.clone(), StubKnowledge(Ok(Vec::new())));
        let event = event_of(EventKind::Message(MessageContent {
            kind: MessageKind::Image,
            id: "m1".to_string(),
            text: None,
        }));
        d.dispatch(vec![event]).await;
        assert_eq!(sender.sent.lock().unwrap()[0].1, replies::IMAGE_ONLY_TEXT);
    }

    #[tokio::test]
    async fn non_text_message_sends_unsupported_notice() {
        let sender = Arc::new(RecordingSender::default());
        let d = dispatcher(sender.clone(), StubKnowledge(Ok(Vec::new())));
        let event = event_of(EventKind::Message(MessageContent {
            kind: MessageKind::Other("sticker".to_string()),
            id: "m1".to_string(),
            text: None,
        }));
        d.dispatch(vec![event]).await;
        assert_eq!(sender.sent.lock().unwrap()[0].1, replies::UNSUPPORTED_TYPE);
    }

    #[tokio::test]
    async fn fallback_text_uses_knowledge_search() {
        let sender = Arc::new(RecordingSender::default());
        let results = vec![SearchResult {
            title: "配送說明".to_string(),
            content: "詳見官網".to_string(),
            score: 1.0,
            source: "kb".to_string(),
        }];
        let d = dispatcher(sender.clone(), StubKnowledge(Ok(results)));
        d.dispatch(vec![text_event("rt1", "看不懂的問題")]).await;
        let sent = sender.sent.lock().unwrap();
        assert!(sent[0].1.contains("📄 配送說明"));
    }

    #[tokio::test]
    async fn knowledge_failure_degrades_to_fixed_message() {
        let sender = Arc::new(RecordingSender::default());
        let d = dispatcher(sender.clone(), StubKnowledge(Err(())));
        d.dispatch(vec![text_event("rt1", "看不懂的問題")]).await;
        assert_eq!(
            sender.sent.lock().unwrap()[0].1,
            crate::knowledge::SEARCH_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn send_failure_does_not_abort_the_batch() {
        // first dispatcher send fails; batch still reaches later events
        let failing = Arc::new(FailingSender);
        let d = dispatcher(failing, StubKnowledge(Ok(Vec::new())));
        // must not panic or stop early
        d.dispatch(vec![
            text_event("rt1", "hi"),
            event_of(EventKind::Follow),
        ])
        .await;
    }

    #[tokio::test]
    async fn batch_is_processed_in_order() {
        let sender = Arc::new(RecordingSender::default());
        let d = dispatcher(sender.clone(), StubKnowledge(Ok(Vec::new())));
        d.dispatch(vec![text_event("rt1", "hi"), text_event("rt2", "價格")])
            .await;
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].0, "rt1");
        assert_eq!(sent[1].0, "rt2");
    }
}
