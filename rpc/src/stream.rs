use crate::server::to_proto;
use crate::Message as ProtoMessage;
use events::RecipientId;
use hub::{Hub, StreamId};
use log::*;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tonic::Status;

/// Server-streaming response body for `StreamMessages`.
///
/// Wraps the receive half of a hub stream channel and guarantees
/// unregistration when the RPC ends for any reason: tonic drops the response
/// stream on graceful channel close, client cancellation, and server
/// shutdown alike, so cleanup lives in `Drop`. Unregistering an
/// already-removed stream is a no-op, so the guard is safe even when the
/// channel was closed from the registry side first.
pub struct MessageStream {
    hub: Arc<Hub>,
    recipient_id: RecipientId,
    stream_id: StreamId,
    receiver: mpsc::Receiver<events::Message>,
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("recipient_id", &self.recipient_id)
            .field("stream_id", &self.stream_id)
            .finish_non_exhaustive()
    }
}

impl MessageStream {
    pub(crate) fn new(
        hub: Arc<Hub>,
        recipient_id: RecipientId,
        stream_id: StreamId,
        receiver: mpsc::Receiver<events::Message>,
    ) -> Self {
        Self {
            hub,
            recipient_id,
            stream_id,
            receiver,
        }
    }
}

impl Stream for MessageStream {
    type Item = Result<ProtoMessage, Status>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut()
            .receiver
            .poll_recv(cx)
            .map(|message| message.map(|m| Ok(to_proto(&m))))
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        debug!(
            "message stream for user {} ended, unregistering",
            self.recipient_id
        );
        let hub = Arc::clone(&self.hub);
        let recipient_id = self.recipient_id.clone();
        let stream_id = self.stream_id.clone();
        // Unregistration takes the registry write lock, so it cannot run
        // synchronously inside Drop.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                hub.unregister_stream(&recipient_id, &stream_id).await;
            });
        }
    }
}
