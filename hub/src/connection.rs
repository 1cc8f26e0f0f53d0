use async_trait::async_trait;
use events::RecipientId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Error surfaced by a connection write. The dispatcher only logs these;
/// a failed write never evicts the connection or aborts a fan-out.
pub type ConnectionError = Box<dyn std::error::Error + Send + Sync>;

/// Unique identifier for a registered connection (server-generated).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live duplex socket able to receive a serialized event payload.
///
/// The registry owns bookkeeping only. The transport that opened the socket
/// drives its lifecycle and must unregister exactly once when its read loop
/// exits, whatever the reason.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Write one serialized payload to the peer.
    async fn send(&self, payload: &str) -> Result<(), ConnectionError>;
}

type ConnectionsByRecipient = HashMap<RecipientId, HashMap<ConnectionId, Arc<dyn Connection>>>;

/// Per-recipient sets of live connections.
///
/// Membership here is the sole source of truth for "is this recipient
/// currently reachable over a socket". An emptied recipient entry is removed
/// on unregistration so departed users do not accumulate.
pub struct ConnectionRegistry {
    connections: RwLock<ConnectionsByRecipient>,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection to the recipient's set. Registering the same id
    /// twice is idempotent.
    pub(crate) async fn register(
        &self,
        recipient_id: RecipientId,
        connection_id: ConnectionId,
        connection: Arc<dyn Connection>,
    ) {
        let mut connections = self.connections.write().await;
        connections
            .entry(recipient_id)
            .or_default()
            .insert(connection_id, connection);
    }

    /// Remove a connection. A no-op when the connection was never registered.
    pub(crate) async fn unregister(&self, recipient_id: &str, connection_id: &ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(for_recipient) = connections.get_mut(recipient_id) {
            for_recipient.remove(connection_id);
            if for_recipient.is_empty() {
                connections.remove(recipient_id);
            }
        }
    }

    /// Read access for the dispatcher. The guard is held across one event's
    /// entire fan-out so the dispatcher sees a consistent membership
    /// snapshot.
    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, ConnectionsByRecipient> {
        self.connections.read().await
    }
}
