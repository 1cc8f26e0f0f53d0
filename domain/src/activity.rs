//! Activity feed: postings recorded and fanned out to the poster's friends.

use crate::error::Error;
use crate::social::FriendGraph;
use chrono::Utc;
use events::{ActivityUpdate, Event, EventPayload, RecipientId};
use hub::Hub;
use log::*;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Newest activities are returned first; feeds are capped at this many
/// entries.
const FEED_LIMIT: usize = 50;

/// In-memory activity log. Stands in for the database-backed activity
/// table, which is out of scope here.
#[derive(Default)]
pub struct ActivityStore {
    activities: RwLock<Vec<ActivityUpdate>>,
}

impl ActivityStore {
    pub async fn insert(&self, activity: ActivityUpdate) {
        self.activities.write().await.push(activity);
    }

    /// Most recent activities posted by any of the given users, newest
    /// first.
    pub async fn feed_for(&self, user_ids: &[RecipientId]) -> Vec<ActivityUpdate> {
        let activities = self.activities.read().await;
        activities
            .iter()
            .rev()
            .filter(|a| user_ids.contains(&a.user_id))
            .take(FEED_LIMIT)
            .cloned()
            .collect()
    }
}

/// Record an activity and notify the poster's friends.
pub async fn post_activity(
    store: &ActivityStore,
    friends: &FriendGraph,
    hub: &Hub,
    user_id: RecipientId,
    kind: String,
    description: String,
) -> Result<ActivityUpdate, Error> {
    if kind.trim().is_empty() {
        return Err(Error::invalid());
    }

    let activity = ActivityUpdate {
        id: Uuid::new_v4(),
        user_id: user_id.clone(),
        kind,
        description,
        created_at: Utc::now(),
    };
    store.insert(activity.clone()).await;

    let recipient_ids = friends.friends_of(&user_id).await;
    if recipient_ids.is_empty() {
        debug!("activity {} posted by {user_id} with no friends to notify", activity.id);
        return Ok(activity);
    }

    hub.publish(Event {
        recipient_ids,
        payload: EventPayload::ActivityUpdate(activity.clone()),
    })
    .await?;

    Ok(activity)
}

/// The caller's view of their friends' recent activity.
pub async fn friends_feed(
    store: &ActivityStore,
    friends: &FriendGraph,
    user_id: &str,
) -> Vec<ActivityUpdate> {
    let friend_ids = friends.friends_of(user_id).await;
    store.feed_for(&friend_ids).await
}
