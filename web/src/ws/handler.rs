use async_trait::async_trait;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use hub::{Connection, ConnectionError, ConnectionId};
use log::*;
use serde::Deserialize;
use service::AppState;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Query parameters for the WebSocket endpoints. Browsers cannot set an
/// Authorization header on an upgrade request, so the token travels as a
/// query parameter instead.
#[derive(Debug, Deserialize)]
pub(crate) struct WsAuthQuery {
    pub token: String,
}

/// GET upgrade to a realtime event socket. Authenticates before upgrading;
/// an invalid token is rejected with 401 and the socket is never opened.
pub(crate) async fn ws_upgrade(
    State(app_state): State<AppState>,
    Query(params): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    match domain::jwt::validate_token(app_state.config.jwt_secret(), &params.token) {
        Ok(claims) => ws.on_upgrade(move |socket| handle_socket(socket, app_state, claims.sub)),
        Err(e) => {
            debug!("websocket upgrade rejected: {e}");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

/// Registers the socket's write half with the hub, then drains inbound
/// frames until the peer goes away. The single unregister call below runs on
/// every exit path of the read loop.
async fn handle_socket(socket: WebSocket, app_state: AppState, user_id: String) {
    let (sender, mut receiver) = socket.split();
    let connection_id = ConnectionId::new();
    let connection = Arc::new(WsConnection {
        sender: Mutex::new(sender),
    });

    app_state
        .hub
        .register_connection(user_id.clone(), connection_id.clone(), connection)
        .await;
    info!("websocket connected for user {user_id}");

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(WsMessage::Close(_)) => break,
            // Clients publish through the HTTP and gRPC APIs; inbound socket
            // traffic is not part of the protocol.
            Ok(_) => {}
            Err(e) => {
                debug!("websocket read error for user {user_id}: {e}");
                break;
            }
        }
    }

    app_state.hub.unregister_connection(&user_id, &connection_id).await;
    info!("websocket disconnected for user {user_id}");
}

/// Write half of an upgraded socket, registered with the hub as a
/// [`Connection`]. The hub hands over payloads already serialized; this
/// adapter only frames them.
struct WsConnection {
    sender: Mutex<SplitSink<WebSocket, WsMessage>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&self, payload: &str) -> Result<(), ConnectionError> {
        self.sender
            .lock()
            .await
            .send(WsMessage::Text(payload.to_owned()))
            .await
            .map_err(Into::into)
    }
}
