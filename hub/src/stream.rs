use events::{Message, RecipientId};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Buffer size of each consumer-facing stream channel. The dispatcher never
/// blocks on a stream: when a consumer falls this far behind, further
/// messages are dropped for it until it catches up.
pub const STREAM_CHANNEL_CAPACITY: usize = 100;

/// Unique identifier for a registered stream channel (server-generated).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamId(String);

impl StreamId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type StreamsByRecipient = HashMap<RecipientId, HashMap<StreamId, mpsc::Sender<Message>>>;

/// Per-recipient sets of bounded message channels owned by streaming RPC
/// consumers.
///
/// The registry holds the send half; the consumer owns the receive half.
/// Removing the sender from the registry is the close: once the buffer
/// drains, the consumer's `recv()` yields `None` and it must stop reading.
/// Because removal happens at most once per id, each channel is closed at
/// most once even under concurrent unregister attempts.
pub struct StreamRegistry {
    streams: RwLock<StreamsByRecipient>,
}

impl StreamRegistry {
    pub(crate) fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
        }
    }

    /// Create a bounded channel for the recipient and register its send
    /// half. The returned receiver belongs to the consumer.
    pub(crate) async fn register(
        &self,
        recipient_id: RecipientId,
    ) -> (StreamId, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let stream_id = StreamId::new();
        let mut streams = self.streams.write().await;
        streams
            .entry(recipient_id)
            .or_default()
            .insert(stream_id.clone(), tx);
        (stream_id, rx)
    }

    /// Remove a stream channel, closing it. A no-op when already removed.
    pub(crate) async fn unregister(&self, recipient_id: &str, stream_id: &StreamId) {
        let mut streams = self.streams.write().await;
        if let Some(for_recipient) = streams.get_mut(recipient_id) {
            for_recipient.remove(stream_id);
            if for_recipient.is_empty() {
                streams.remove(recipient_id);
            }
        }
    }

    /// Close every registered stream. Used during hub shutdown.
    pub(crate) async fn close_all(&self) {
        self.streams.write().await.clear();
    }

    /// Read access for the dispatcher, held across one event's fan-out.
    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, StreamsByRecipient> {
        self.streams.read().await
    }
}
