//! Chat: message history plus the realtime publish to the receiver.

use crate::error::Error;
use chrono::Utc;
use events::{Event, EventPayload, Message, RecipientId};
use hub::Hub;
use log::*;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory conversation store, ordered by insertion. Stands in for the
/// database-backed message table, which is out of scope here.
#[derive(Default)]
pub struct MessageStore {
    messages: RwLock<Vec<Message>>,
}

impl MessageStore {
    pub async fn insert(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    /// Messages exchanged between the two users, oldest first.
    pub async fn conversation(&self, user_id: &str, friend_id: &str) -> Vec<Message> {
        let messages = self.messages.read().await;
        messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_id && m.receiver_id == friend_id)
                    || (m.sender_id == friend_id && m.receiver_id == user_id)
            })
            .cloned()
            .collect()
    }
}

/// Create a message, record it, and publish it to the receiver's devices.
///
/// The event is addressed to the receiver only; the sender's own UI updates
/// from the returned message.
pub async fn send_message(
    store: &MessageStore,
    hub: &Hub,
    sender_id: RecipientId,
    receiver_id: RecipientId,
    text: String,
) -> Result<Message, Error> {
    if text.trim().is_empty() || receiver_id.is_empty() {
        return Err(Error::invalid());
    }

    let message = Message {
        id: Uuid::new_v4(),
        sender_id,
        receiver_id: receiver_id.clone(),
        text,
        created_at: Utc::now(),
    };
    store.insert(message.clone()).await;

    debug!("publishing chat message {} to {receiver_id}", message.id);
    hub.publish(Event {
        recipient_ids: vec![receiver_id],
        payload: EventPayload::Message(message.clone()),
    })
    .await?;

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn sent_message_is_stored_and_reaches_the_receivers_stream() {
        let store = MessageStore::default();
        let hub = Hub::new();
        let (_stream_id, mut stream_rx) = hub.register_stream("u1".to_string()).await;

        let sent = send_message(
            &store,
            &hub,
            "u2".to_string(),
            "u1".to_string(),
            "hi".to_string(),
        )
        .await
        .unwrap();

        let streamed = timeout(Duration::from_secs(2), stream_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(streamed, sent);

        // History is visible from both sides of the conversation.
        assert_eq!(store.conversation("u1", "u2").await, vec![sent.clone()]);
        assert_eq!(store.conversation("u2", "u1").await, vec![sent]);
    }

    #[tokio::test]
    async fn conversation_excludes_other_pairs() {
        let store = MessageStore::default();
        let hub = Hub::new();

        send_message(&store, &hub, "u1".into(), "u2".into(), "to u2".into())
            .await
            .unwrap();
        send_message(&store, &hub, "u1".into(), "u3".into(), "to u3".into())
            .await
            .unwrap();

        let conversation = store.conversation("u1", "u2").await;
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation[0].text, "to u2");
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_any_side_effect() {
        let store = MessageStore::default();
        let hub = Hub::new();

        let err = send_message(&store, &hub, "u1".into(), "u2".into(), "   ".into())
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, DomainErrorKind::Invalid);
        assert!(store.conversation("u1", "u2").await.is_empty());
    }
}
