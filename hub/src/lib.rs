//! Realtime fan-out hub: connection/stream registries plus the single-worker
//! event dispatcher.
//!
//! This crate is the only part of the platform with genuine concurrency
//! coordination. Everything else (HTTP controllers, the gRPC service, the
//! domain services that originate events) talks to it through a narrow
//! surface: `publish` and the four register/unregister operations.
//!
//! # Architecture
//!
//! - **Connection registry**: per-recipient sets of live sockets, addressed
//!   by server-generated `ConnectionId`s. Multiple simultaneous connections
//!   per recipient (multi-device) are expected and all receive every event.
//! - **Stream registry**: per-recipient sets of bounded message channels
//!   owned by streaming RPC consumers. Unregistration closes the channel,
//!   exactly once.
//! - **Dispatcher**: a single worker task drains a bounded inbound queue in
//!   FIFO order and fans each event out to both registries. One worker means
//!   delivery order matches publish order for every recipient.
//!
//! # Backpressure
//!
//! `publish` suspends the caller while the inbound queue (capacity 100) is
//! full; a burst of unconsumed events throttles producers instead of growing
//! memory or dropping events. Stream channels are the opposite: the
//! dispatcher offers messages without blocking and drops (with a log line)
//! when a consumer's buffer (capacity 100) is full.
//!
//! # Lifecycle
//!
//! The hub is constructed once at process start and shared as `Arc<Hub>`.
//! Registration entries are owned by the transport that created them: the
//! websocket handler unregisters when its read loop exits, the RPC stream
//! unregisters when it is dropped. `Hub::shutdown` stops accepting
//! publishes, drains the queue, then closes every remaining stream.

pub mod connection;
pub mod dispatcher;
pub mod stream;

pub use connection::{Connection, ConnectionError, ConnectionId};
pub use dispatcher::{Hub, PublishError, EVENT_QUEUE_CAPACITY};
pub use stream::{StreamId, STREAM_CHANNEL_CAPACITY};
