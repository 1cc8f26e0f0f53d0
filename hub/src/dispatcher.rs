use crate::connection::{Connection, ConnectionId, ConnectionRegistry};
use crate::stream::{StreamId, StreamRegistry};
use events::{Event, EventPayload, Message, RecipientId};
use log::*;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Capacity of the inbound event queue. When it is full, `publish` suspends
/// the caller: a burst of unconsumed events throttles producers instead of
/// growing memory without bound or silently dropping events.
pub const EVENT_QUEUE_CAPACITY: usize = 100;

/// Error returned by [`Hub::publish`] once the hub has been shut down.
/// During steady-state operation publishing cannot fail.
#[derive(Debug)]
pub struct PublishError;

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "hub is shut down and no longer accepts events")
    }
}

impl std::error::Error for PublishError {}

struct Registries {
    connections: ConnectionRegistry,
    streams: StreamRegistry,
}

/// The realtime hub: both registries plus the single dispatcher worker.
///
/// Constructed once at process start and shared as `Arc<Hub>` with every
/// collaborator that registers transports or publishes events. There is
/// exactly one worker per hub, which is what yields global FIFO delivery
/// ordering across all recipients.
pub struct Hub {
    registries: Arc<Registries>,
    publish_tx: RwLock<Option<mpsc::Sender<Event>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Hub {
    /// Create the hub and start its dispatcher worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (publish_tx, publish_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let registries = Arc::new(Registries {
            connections: ConnectionRegistry::new(),
            streams: StreamRegistry::new(),
        });
        let worker = tokio::spawn(run_dispatcher(Arc::clone(&registries), publish_rx));
        Self {
            registries,
            publish_tx: RwLock::new(Some(publish_tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue an event for fan-out.
    ///
    /// Suspends while the inbound queue is full. Whether a registration
    /// racing with this publish sees the event is unspecified; registrations
    /// are guaranteed visible only to events published after they complete.
    pub async fn publish(&self, event: Event) -> Result<(), PublishError> {
        let tx = self.publish_tx.read().await.clone();
        match tx {
            Some(tx) => tx.send(event).await.map_err(|_| PublishError),
            None => Err(PublishError),
        }
    }

    /// Add a socket to the recipient's connection set. Idempotent for the
    /// same `connection_id`.
    pub async fn register_connection(
        &self,
        recipient_id: RecipientId,
        connection_id: ConnectionId,
        connection: Arc<dyn Connection>,
    ) {
        debug!("registering connection {connection_id} for {recipient_id}");
        self.registries
            .connections
            .register(recipient_id, connection_id, connection)
            .await;
    }

    /// Remove a socket from the recipient's connection set. A no-op when the
    /// connection was never registered or was already removed.
    pub async fn unregister_connection(&self, recipient_id: &str, connection_id: &ConnectionId) {
        debug!("unregistering connection {connection_id} for {recipient_id}");
        self.registries
            .connections
            .unregister(recipient_id, connection_id)
            .await;
    }

    /// Create and register a bounded stream channel for the recipient.
    /// The returned receiver is owned by the consuming RPC handler.
    pub async fn register_stream(
        &self,
        recipient_id: RecipientId,
    ) -> (StreamId, mpsc::Receiver<Message>) {
        let (stream_id, rx) = self.registries.streams.register(recipient_id.clone()).await;
        debug!("registered stream {stream_id} for {recipient_id}");
        (stream_id, rx)
    }

    /// Remove a stream channel, closing it toward its consumer. Closing
    /// happens at most once; repeated calls are no-ops.
    pub async fn unregister_stream(&self, recipient_id: &str, stream_id: &StreamId) {
        debug!("unregistering stream {stream_id} for {recipient_id}");
        self.registries
            .streams
            .unregister(recipient_id, stream_id)
            .await;
    }

    /// Stop accepting publishes, drain the queue, then close every remaining
    /// stream.
    ///
    /// Events already queued are still fanned out before the worker exits.
    pub async fn shutdown(&self) {
        self.publish_tx.write().await.take();
        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(e) = worker.await {
                error!("dispatcher worker did not shut down cleanly: {e}");
            }
        }
        self.registries.streams.close_all().await;
        info!("hub shut down");
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// The single dispatcher loop. Dequeues strictly in arrival order and runs
/// each event's fan-out to completion before touching the next.
async fn run_dispatcher(registries: Arc<Registries>, mut publish_rx: mpsc::Receiver<Event>) {
    while let Some(event) = publish_rx.recv().await {
        fan_out(&registries, event).await;
    }
    debug!("event queue closed, dispatcher exiting");
}

/// Fan one event out to every connection and (for chat messages) every
/// stream channel of every named recipient.
///
/// Both registries stay read-locked for the whole fan-out, so membership is
/// a consistent snapshot for this event; register/unregister calls block
/// until the event is fully dispatched.
async fn fan_out(registries: &Registries, event: Event) {
    let payload = match serde_json::to_string(&event.payload) {
        Ok(payload) => payload,
        Err(e) => {
            error!("failed to serialize {} event: {e}", event.payload.event_type());
            return;
        }
    };

    let connections = registries.connections.read().await;
    let streams = registries.streams.read().await;

    for recipient_id in &event.recipient_ids {
        if let Some(for_recipient) = connections.get(recipient_id) {
            debug!(
                "delivering {} event to {} connection(s) of {recipient_id}",
                event.payload.event_type(),
                for_recipient.len()
            );
            for (connection_id, connection) in for_recipient {
                // Best-effort: a dead socket stays registered until its own
                // handler notices and unregisters it.
                if let Err(e) = connection.send(&payload).await {
                    warn!("failed to write to connection {connection_id} of {recipient_id}: {e}");
                }
            }
        }

        if let EventPayload::Message(message) = &event.payload {
            if let Some(for_recipient) = streams.get(recipient_id) {
                for (stream_id, tx) in for_recipient {
                    match tx.try_send(message.clone()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            warn!("stream {stream_id} of {recipient_id} is full, dropping message");
                        }
                        Err(TrySendError::Closed(_)) => {
                            warn!("stream {stream_id} of {recipient_id} is closed, dropping message");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::STREAM_CHANNEL_CAPACITY;
    use async_trait::async_trait;
    use chrono::Utc;
    use events::ActivityUpdate;
    use std::time::Duration;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    /// Connection that forwards every written payload to a test channel.
    struct RecordingConnection {
        tx: mpsc::UnboundedSender<String>,
    }

    impl RecordingConnection {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { tx }), rx)
        }
    }

    #[async_trait]
    impl Connection for RecordingConnection {
        async fn send(&self, payload: &str) -> Result<(), crate::ConnectionError> {
            self.tx.send(payload.to_owned()).map_err(Into::into)
        }
    }

    /// Connection whose writes always fail.
    struct BrokenConnection;

    #[async_trait]
    impl Connection for BrokenConnection {
        async fn send(&self, _payload: &str) -> Result<(), crate::ConnectionError> {
            Err("broken pipe".into())
        }
    }

    /// Connection that parks until released, to keep the dispatcher busy.
    struct StallingConnection {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Connection for StallingConnection {
        async fn send(&self, _payload: &str) -> Result<(), crate::ConnectionError> {
            self.release.notified().await;
            Ok(())
        }
    }

    fn message_to(receiver: &str, text: &str) -> Message {
        Message {
            id: uuid::Uuid::new_v4(),
            sender_id: "u2".to_string(),
            receiver_id: receiver.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    fn message_event(receiver: &str, text: &str) -> Event {
        Event {
            recipient_ids: vec![receiver.to_string()],
            payload: EventPayload::Message(message_to(receiver, text)),
        }
    }

    fn activity_event(recipients: &[&str], description: &str) -> Event {
        Event {
            recipient_ids: recipients.iter().map(|r| r.to_string()).collect(),
            payload: EventPayload::ActivityUpdate(ActivityUpdate {
                id: uuid::Uuid::new_v4(),
                user_id: "u2".to_string(),
                kind: "run".to_string(),
                description: description.to_string(),
                created_at: Utc::now(),
            }),
        }
    }

    async fn recv_payload(rx: &mut mpsc::UnboundedReceiver<String>) -> serde_json::Value {
        let raw = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a delivery")
            .expect("connection channel closed");
        serde_json::from_str(&raw).expect("payload is not valid JSON")
    }

    #[tokio::test]
    async fn every_connection_of_a_recipient_receives_the_payload_once() {
        let hub = Hub::new();
        let (first, mut first_rx) = RecordingConnection::new();
        let (second, mut second_rx) = RecordingConnection::new();
        hub.register_connection("u1".to_string(), ConnectionId::new(), first)
            .await;
        hub.register_connection("u1".to_string(), ConnectionId::new(), second)
            .await;

        hub.publish(activity_event(&["u1"], "first")).await.unwrap();
        // The second event doubles as a barrier proving "first" arrived
        // exactly once on each connection.
        hub.publish(activity_event(&["u1"], "second")).await.unwrap();

        for rx in [&mut first_rx, &mut second_rx] {
            assert_eq!(recv_payload(rx).await["data"]["description"], "first");
            assert_eq!(recv_payload(rx).await["data"]["description"], "second");
        }
    }

    #[tokio::test]
    async fn unregistered_connection_receives_no_further_events() {
        let hub = Hub::new();
        let (kept, mut kept_rx) = RecordingConnection::new();
        let (removed, mut removed_rx) = RecordingConnection::new();
        let removed_id = ConnectionId::new();
        hub.register_connection("u1".to_string(), ConnectionId::new(), kept)
            .await;
        hub.register_connection("u1".to_string(), removed_id.clone(), removed)
            .await;

        hub.publish(activity_event(&["u1"], "before")).await.unwrap();
        assert_eq!(recv_payload(&mut kept_rx).await["data"]["description"], "before");
        assert_eq!(
            recv_payload(&mut removed_rx).await["data"]["description"],
            "before"
        );

        hub.unregister_connection("u1", &removed_id).await;
        hub.publish(activity_event(&["u1"], "after")).await.unwrap();

        assert_eq!(recv_payload(&mut kept_rx).await["data"]["description"], "after");
        // "after" has fully fanned out by now; the removed connection saw
        // nothing from it.
        assert!(matches!(removed_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn double_unregistration_never_errors() {
        let hub = Hub::new();
        let (connection, _rx) = RecordingConnection::new();
        let connection_id = ConnectionId::new();
        hub.register_connection("u1".to_string(), connection_id.clone(), connection)
            .await;
        hub.unregister_connection("u1", &connection_id).await;
        hub.unregister_connection("u1", &connection_id).await;

        let (stream_id, _stream_rx) = hub.register_stream("u1".to_string()).await;
        hub.unregister_stream("u1", &stream_id).await;
        hub.unregister_stream("u1", &stream_id).await;

        // The hub is still operational afterwards.
        hub.publish(activity_event(&["u1"], "still alive")).await.unwrap();
    }

    #[tokio::test]
    async fn stream_observes_messages_in_publish_order() {
        let hub = Hub::new();
        let (_stream_id, mut stream_rx) = hub.register_stream("u1".to_string()).await;

        hub.publish(message_event("u1", "one")).await.unwrap();
        hub.publish(message_event("u1", "two")).await.unwrap();

        let first = timeout(Duration::from_secs(2), stream_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let second = timeout(Duration::from_secs(2), stream_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.text, "one");
        assert_eq!(second.text, "two");
    }

    #[tokio::test]
    async fn saturated_stream_drops_excess_while_sockets_get_everything() {
        let hub = Hub::new();
        let (connection, mut connection_rx) = RecordingConnection::new();
        hub.register_connection("u1".to_string(), ConnectionId::new(), connection)
            .await;
        let (_stream_id, mut stream_rx) = hub.register_stream("u1".to_string()).await;

        let total = STREAM_CHANNEL_CAPACITY + 1;
        for i in 0..total {
            hub.publish(message_event("u1", &format!("m{i}"))).await.unwrap();
        }

        // The un-drained stream keeps exactly its buffer capacity...
        for _ in 0..total {
            recv_payload(&mut connection_rx).await;
        }
        let mut buffered = 0;
        while stream_rx.try_recv().is_ok() {
            buffered += 1;
        }
        assert_eq!(buffered, STREAM_CHANNEL_CAPACITY);

        // ...and is still open: the drop was silent toward the consumer.
        hub.publish(message_event("u1", "after the burst")).await.unwrap();
        let next = timeout(Duration::from_secs(2), stream_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.text, "after the burst");
    }

    #[tokio::test]
    async fn closed_stream_yields_none_and_nothing_more() {
        let hub = Hub::new();
        let (stream_id, mut stream_rx) = hub.register_stream("u1".to_string()).await;
        hub.unregister_stream("u1", &stream_id).await;

        assert!(stream_rx.recv().await.is_none());

        // Publishing afterwards must not panic or resurrect the stream.
        hub.publish(message_event("u1", "too late")).await.unwrap();
        assert!(stream_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn chat_message_reaches_socket_and_stream_exactly_once() {
        let hub = Hub::new();
        let (connection, mut connection_rx) = RecordingConnection::new();
        hub.register_connection("u1".to_string(), ConnectionId::new(), connection)
            .await;
        let (_stream_id, mut stream_rx) = hub.register_stream("u1".to_string()).await;

        let message = message_to("u1", "hi");
        hub.publish(Event {
            recipient_ids: vec!["u1".to_string()],
            payload: EventPayload::Message(message.clone()),
        })
        .await
        .unwrap();

        let payload = recv_payload(&mut connection_rx).await;
        assert_eq!(payload["type"], "message");
        assert_eq!(payload["data"]["text"], "hi");
        assert_eq!(payload["data"]["sender_id"], "u2");
        assert_eq!(payload["data"]["receiver_id"], "u1");

        let streamed = timeout(Duration::from_secs(2), stream_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(streamed, message);
        assert!(matches!(stream_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn write_failure_neither_evicts_nor_aborts_fan_out() {
        let hub = Hub::new();
        hub.register_connection("u1".to_string(), ConnectionId::new(), Arc::new(BrokenConnection))
            .await;
        let (healthy, mut healthy_rx) = RecordingConnection::new();
        hub.register_connection("u2".to_string(), ConnectionId::new(), healthy)
            .await;

        // u1's broken socket is visited first in the recipient order; u2
        // must still be reached within the same event.
        hub.publish(activity_event(&["u1", "u2"], "shared")).await.unwrap();
        assert_eq!(recv_payload(&mut healthy_rx).await["data"]["description"], "shared");

        // The broken connection is still registered and still written to.
        hub.publish(activity_event(&["u1", "u2"], "again")).await.unwrap();
        assert_eq!(recv_payload(&mut healthy_rx).await["data"]["description"], "again");
    }

    #[tokio::test]
    async fn publish_suspends_once_the_queue_is_full() {
        let hub = Hub::new();
        let release = Arc::new(Notify::new());
        hub.register_connection(
            "u1".to_string(),
            ConnectionId::new(),
            Arc::new(StallingConnection {
                release: Arc::clone(&release),
            }),
        )
        .await;

        // One event occupies the dispatcher (stalled mid-write), the rest
        // fill the queue to its capacity.
        hub.publish(activity_event(&["u1"], "stalls")).await.unwrap();
        for i in 0..EVENT_QUEUE_CAPACITY {
            hub.publish(activity_event(&["u1"], &format!("fill {i}")))
                .await
                .unwrap();
        }

        // The next publish must block rather than drop or error.
        let overflow = hub.publish(activity_event(&["u1"], "overflow"));
        assert!(timeout(Duration::from_millis(200), overflow).await.is_err());

        // Releasing the stalled write lets the dispatcher drain again.
        release.notify_waiters();
        hub.publish(activity_event(&["u1"], "resumed")).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_drains_queued_events_and_closes_streams() {
        let hub = Hub::new();
        let (connection, mut connection_rx) = RecordingConnection::new();
        hub.register_connection("u1".to_string(), ConnectionId::new(), connection)
            .await;
        let (_stream_id, mut stream_rx) = hub.register_stream("u1".to_string()).await;

        for i in 0..5 {
            hub.publish(message_event("u1", &format!("m{i}"))).await.unwrap();
        }
        hub.shutdown().await;

        for i in 0..5 {
            let payload = recv_payload(&mut connection_rx).await;
            assert_eq!(payload["data"]["text"], format!("m{i}"));
        }

        for i in 0..5 {
            let streamed = stream_rx.recv().await.unwrap();
            assert_eq!(streamed.text, format!("m{i}"));
        }
        // After the drain, the consumer observes the close.
        assert!(stream_rx.recv().await.is_none());

        assert!(hub.publish(message_event("u1", "rejected")).await.is_err());
    }
}
