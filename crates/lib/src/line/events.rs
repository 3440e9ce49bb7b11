//! Webhook payload decoding into typed inbound events.
//!
//! Unknown event or message types decode into `Other(..)` instead of failing
//! the batch, so new platform event types never break ingestion. Only a body
//! that is not valid JSON for the envelope fails the whole request.

use serde::Deserialize;
use thiserror::Error;

/// Webhook envelope: `{ "events": [ ... ] }`.
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    events: Vec<WireEvent>,
}

/// One raw event as sent by the platform.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    #[serde(rename = "type", default)]
    typ: String,
    #[serde(default)]
    source: WireSource,
    #[serde(default)]
    reply_token: String,
    #[serde(default)]
    message: Option<WireMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSource {
    #[serde(rename = "type", default)]
    typ: String,
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(rename = "type", default)]
    typ: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    text: Option<String>,
}

/// Malformed webhook body; the whole batch is rejected, no partial results.
#[derive(Debug, Error)]
#[error("invalid webhook payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Where an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    User,
    Group,
}

/// Kind of a message event's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Other(String),
}

/// Content of a message event. A `Text` kind does not guarantee `text` is
/// present on the wire, so it stays optional here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent {
    pub kind: MessageKind,
    pub id: String,
    pub text: Option<String>,
}

/// A decoded webhook event. `Message` always carries its content; a wire
/// "message" event with no message body folds to `Other("message")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Message(MessageContent),
    Follow,
    Unfollow,
    Other(String),
}

impl EventKind {
    /// Short name for logging.
    pub fn name(&self) -> &str {
        match self {
            EventKind::Message(_) => "message",
            EventKind::Follow => "follow",
            EventKind::Unfollow => "unfollow",
            EventKind::Other(kind) => kind.as_str(),
        }
    }
}

/// One inbound event, immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub source_user_id: String,
    pub source_kind: SourceKind,
    pub reply_token: String,
}

/// Decode a raw webhook body into inbound events, preserving array order.
pub fn decode(raw: &[u8]) -> Result<Vec<InboundEvent>, DecodeError> {
    let payload: WebhookPayload = serde_json::from_slice(raw)?;
    Ok(payload.events.into_iter().map(InboundEvent::from).collect())
}

impl From<WireEvent> for InboundEvent {
    fn from(wire: WireEvent) -> Self {
        let kind = match wire.typ.as_str() {
            "message" => match wire.message {
                Some(m) => EventKind::Message(MessageContent::from(m)),
                None => EventKind::Other("message".to_string()),
            },
            "follow" => EventKind::Follow,
            "unfollow" => EventKind::Unfollow,
            other => EventKind::Other(other.to_string()),
        };
        let source_kind = match wire.source.typ.as_str() {
            "group" => SourceKind::Group,
            _ => SourceKind::User,
        };
        InboundEvent {
            kind,
            source_user_id: wire.source.user_id,
            source_kind,
            reply_token: wire.reply_token,
        }
    }
}

impl From<WireMessage> for MessageContent {
    fn from(wire: WireMessage) -> Self {
        let kind = match wire.typ.as_str() {
            "text" => MessageKind::Text,
            "image" => MessageKind::Image,
            other => MessageKind::Other(other.to_string()),
        };
        MessageContent {
            kind,
            id: wire.id,
            text: wire.text,
        }
    }
}
