//! Event types shared by the realtime hub and its producers.
//!
//! This crate defines the payloads that flow from business logic through the
//! hub out to connected clients. It has no dependencies on other internal
//! crates, so the domain layer, the hub, and both transports (web, rpc) can
//! name these types without circular dependencies.
//!
//! # Wire format
//!
//! Payloads serialize as a tagged envelope so that clients can handle every
//! case exhaustively instead of sniffing field names:
//!
//! ```json
//! {"type": "message", "data": {"id": "...", "sender_id": "...", ...}}
//! ```
//!
//! Timestamps are `chrono::DateTime<Utc>` in process and seconds-since-epoch
//! on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A type alias that represents any entity's internal id field data type.
pub type Id = Uuid;

/// Opaque identifier of an event recipient.
///
/// The web and rpc layers produce it from a validated token subject; the hub
/// treats it purely as an addressing key.
pub type RecipientId = String;

/// A chat message.
///
/// The only payload kind that is also fanned out to stream channels, in
/// addition to sockets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Id,
    pub sender_id: RecipientId,
    pub receiver_id: RecipientId,
    pub text: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// An entry in the friends activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityUpdate {
    pub id: Id,
    pub user_id: RecipientId,
    /// Free-form activity kind, e.g. "run" or "steps".
    pub kind: String,
    pub description: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// A challenge lifecycle notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeUpdate {
    pub challenge_id: Id,
    pub name: String,
    /// The user whose action triggered the notification.
    pub user_id: RecipientId,
    pub action: ChallengeAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeAction {
    Created,
    Joined,
}

/// Payload of a single hub event, dispatched to every socket of every named
/// recipient. Chat messages additionally reach registered stream channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventPayload {
    #[serde(rename = "message")]
    Message(Message),
    #[serde(rename = "activity_update")]
    ActivityUpdate(ActivityUpdate),
    #[serde(rename = "challenge_event")]
    ChallengeEvent(ChallengeUpdate),
}

impl EventPayload {
    /// Discriminant name as it appears on the wire; used for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::Message(_) => "message",
            EventPayload::ActivityUpdate(_) => "activity_update",
            EventPayload::ChallengeEvent(_) => "challenge_event",
        }
    }
}

/// The unit submitted to the hub for fan-out: who should receive the payload,
/// in producer-chosen order, plus the payload itself.
///
/// Recipient lists are always computed server-side by the originating domain
/// service, never taken from a client.
#[derive(Debug, Clone)]
pub struct Event {
    pub recipient_ids: Vec<RecipientId>,
    pub payload: EventPayload,
}
