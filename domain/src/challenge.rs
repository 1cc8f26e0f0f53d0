//! Group challenges: create and join, with notifications to the users who
//! care (the creator's friends on creation, current participants on join).

use crate::error::Error;
use crate::social::FriendGraph;
use chrono::{DateTime, Utc};
use events::{ChallengeAction, ChallengeUpdate, Event, EventPayload, Id, RecipientId};
use hub::Hub;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub id: Id,
    pub name: String,
    pub creator_id: RecipientId,
    pub participant_ids: Vec<RecipientId>,
    pub created_at: DateTime<Utc>,
}

/// In-memory challenge table. Stands in for the database-backed challenge
/// and participant tables, which are out of scope here.
#[derive(Default)]
pub struct ChallengeStore {
    challenges: RwLock<HashMap<Id, Challenge>>,
}

impl ChallengeStore {
    pub async fn insert(&self, challenge: Challenge) {
        self.challenges
            .write()
            .await
            .insert(challenge.id, challenge);
    }

    pub async fn get(&self, id: Id) -> Option<Challenge> {
        self.challenges.read().await.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<Challenge> {
        let mut challenges: Vec<_> = self.challenges.read().await.values().cloned().collect();
        challenges.sort_by_key(|c| c.created_at);
        challenges
    }

    /// Add `user_id` to the challenge. Returns the previous participant list
    /// when the user was newly added, `None` when they already belonged.
    async fn add_participant(
        &self,
        id: Id,
        user_id: &str,
    ) -> Result<Option<Vec<RecipientId>>, Error> {
        let mut challenges = self.challenges.write().await;
        let challenge = challenges.get_mut(&id).ok_or_else(Error::not_found)?;
        if challenge.participant_ids.iter().any(|p| p == user_id) {
            return Ok(None);
        }
        let existing = challenge.participant_ids.clone();
        challenge.participant_ids.push(user_id.to_owned());
        Ok(Some(existing))
    }
}

/// Create a challenge with the creator as its first participant, announcing
/// it to the creator's friends.
pub async fn create_challenge(
    store: &ChallengeStore,
    friends: &FriendGraph,
    hub: &Hub,
    creator_id: RecipientId,
    name: String,
) -> Result<Challenge, Error> {
    if name.trim().is_empty() {
        return Err(Error::invalid());
    }

    let challenge = Challenge {
        id: Uuid::new_v4(),
        name: name.clone(),
        creator_id: creator_id.clone(),
        participant_ids: vec![creator_id.clone()],
        created_at: Utc::now(),
    };
    store.insert(challenge.clone()).await;

    let recipient_ids = friends.friends_of(&creator_id).await;
    if !recipient_ids.is_empty() {
        hub.publish(Event {
            recipient_ids,
            payload: EventPayload::ChallengeEvent(ChallengeUpdate {
                challenge_id: challenge.id,
                name,
                user_id: creator_id,
                action: ChallengeAction::Created,
            }),
        })
        .await?;
    }

    Ok(challenge)
}

/// Join an existing challenge, notifying the participants who were already
/// in it. Joining twice is a no-op.
pub async fn join_challenge(
    store: &ChallengeStore,
    hub: &Hub,
    user_id: RecipientId,
    challenge_id: Id,
) -> Result<Challenge, Error> {
    let existing = store.add_participant(challenge_id, &user_id).await?;

    // Fetch after mutation so the caller sees themselves in the list.
    let challenge = store.get(challenge_id).await.ok_or_else(Error::not_found)?;

    if let Some(recipient_ids) = existing {
        if !recipient_ids.is_empty() {
            hub.publish(Event {
                recipient_ids,
                payload: EventPayload::ChallengeEvent(ChallengeUpdate {
                    challenge_id: challenge.id,
                    name: challenge.name.clone(),
                    user_id,
                    action: ChallengeAction::Joined,
                }),
            })
            .await?;
        }
    }

    Ok(challenge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    struct Recording {
        tx: mpsc::UnboundedSender<String>,
    }

    #[async_trait::async_trait]
    impl hub::Connection for Recording {
        async fn send(&self, payload: &str) -> Result<(), hub::ConnectionError> {
            self.tx.send(payload.to_owned()).map_err(Into::into)
        }
    }

    fn recording_connection() -> (Arc<Recording>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Recording { tx }), rx)
    }

    async fn recv_payload(rx: &mut mpsc::UnboundedReceiver<String>) -> serde_json::Value {
        let raw = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a delivery")
            .expect("connection channel closed");
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn creation_announces_to_friends() {
        let store = ChallengeStore::default();
        let friends = FriendGraph::default();
        let hub = Hub::new();
        friends.add_friendship("u1", "u2").await;

        let (conn, mut rx) = recording_connection();
        hub.register_connection("u2".to_string(), hub::ConnectionId::new(), conn)
            .await;

        let challenge = create_challenge(&store, &friends, &hub, "u1".into(), "10k steps".into())
            .await
            .unwrap();
        assert_eq!(challenge.participant_ids, vec!["u1".to_string()]);

        let payload = recv_payload(&mut rx).await;
        assert_eq!(payload["type"], "challenge_event");
        assert_eq!(payload["data"]["action"], "created");
        assert_eq!(payload["data"]["name"], "10k steps");
    }

    #[tokio::test]
    async fn joining_notifies_existing_participants_only() {
        let store = ChallengeStore::default();
        let friends = FriendGraph::default();
        let hub = Hub::new();

        let challenge = create_challenge(&store, &friends, &hub, "u1".into(), "plank month".into())
            .await
            .unwrap();

        let (creator_conn, mut creator_rx) = recording_connection();
        hub.register_connection("u1".to_string(), hub::ConnectionId::new(), creator_conn)
            .await;
        let (joiner_conn, mut joiner_rx) = recording_connection();
        hub.register_connection("u2".to_string(), hub::ConnectionId::new(), joiner_conn)
            .await;

        let joined = join_challenge(&store, &hub, "u2".into(), challenge.id)
            .await
            .unwrap();
        assert_eq!(joined.participant_ids.len(), 2);

        let payload = recv_payload(&mut creator_rx).await;
        assert_eq!(payload["data"]["action"], "joined");
        assert_eq!(payload["data"]["user_id"], "u2");

        // The joiner was not an existing participant; no echo to them.
        assert!(joiner_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn joining_twice_is_a_noop() {
        let store = ChallengeStore::default();
        let friends = FriendGraph::default();
        let hub = Hub::new();

        let challenge = create_challenge(&store, &friends, &hub, "u1".into(), "rowing".into())
            .await
            .unwrap();
        join_challenge(&store, &hub, "u2".into(), challenge.id)
            .await
            .unwrap();
        let again = join_challenge(&store, &hub, "u2".into(), challenge.id)
            .await
            .unwrap();
        assert_eq!(again.participant_ids.len(), 2);
    }

    #[tokio::test]
    async fn joining_missing_challenge_is_not_found() {
        let store = ChallengeStore::default();
        let hub = Hub::new();

        let err = join_challenge(&store, &hub, "u2".into(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, DomainErrorKind::NotFound);
    }
}
