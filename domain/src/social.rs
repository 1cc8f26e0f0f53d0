//! Friend relationships, queried to compute event recipient lists.

use events::RecipientId;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Symmetric friendship edges.
///
/// Activity and challenge events are addressed to the recipients this graph
/// yields; clients never supply recipient lists themselves. Stands in for
/// the database-backed friend tables, which are out of scope here.
#[derive(Default)]
pub struct FriendGraph {
    edges: RwLock<HashMap<RecipientId, HashSet<RecipientId>>>,
}

impl FriendGraph {
    /// Record a friendship in both directions.
    pub async fn add_friendship(&self, a: &str, b: &str) {
        let mut edges = self.edges.write().await;
        edges.entry(a.to_owned()).or_default().insert(b.to_owned());
        edges.entry(b.to_owned()).or_default().insert(a.to_owned());
    }

    pub async fn friends_of(&self, user_id: &str) -> Vec<RecipientId> {
        let edges = self.edges.read().await;
        edges
            .get(user_id)
            .map(|friends| friends.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn friendship_is_symmetric() {
        let graph = FriendGraph::default();
        graph.add_friendship("u1", "u2").await;

        assert_eq!(graph.friends_of("u1").await, vec!["u2".to_string()]);
        assert_eq!(graph.friends_of("u2").await, vec!["u1".to_string()]);
    }

    #[tokio::test]
    async fn unknown_user_has_no_friends() {
        let graph = FriendGraph::default();
        assert!(graph.friends_of("nobody").await.is_empty());
    }
}
