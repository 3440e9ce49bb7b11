//! LINE messaging platform: webhook signature verification, event decoding,
//! and outbound reply delivery.
//!
//! The webhook handler verifies the `X-Line-Signature` header before the body
//! is parsed; decoded events are handed to the dispatcher.

mod events;
mod send;
mod signature;

pub use events::{DecodeError, EventKind, InboundEvent, MessageContent, MessageKind, SourceKind};
pub use events::decode;
pub use send::{DeliveryError, LineApiSender, LogOnlySender, ReplySender};
pub use signature::{sign, verify};
