use crate::stream::MessageStream;
use crate::wellness_service_server::{WellnessService, WellnessServiceServer};
use crate::{
    GetMessagesRequest, GetMessagesResponse, Message as ProtoMessage, SendMessageRequest,
    SendMessageResponse, StreamMessagesRequest,
};
use log::*;
use service::AppState;
use std::future::Future;
use std::sync::Arc;
use tonic::metadata::MetadataMap;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// gRPC implementation of the chat API.
///
/// Shares the domain services and hub with the HTTP transport, so a message
/// sent on either surface reaches consumers connected on both.
pub struct WellnessRpc {
    app_state: AppState,
}

impl WellnessRpc {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

#[tonic::async_trait]
impl WellnessService for WellnessRpc {
    async fn send_message(
        &self,
        request: Request<SendMessageRequest>,
    ) -> Result<Response<SendMessageResponse>, Status> {
        let user_id =
            authenticated_user_id(request.metadata(), self.app_state.config.jwt_secret())?;
        let req = request.into_inner();

        let message = domain::chat::send_message(
            &self.app_state.stores.messages,
            self.app_state.hub_ref(),
            user_id,
            req.receiver_id,
            req.text,
        )
        .await
        .map_err(|e| match e.error_kind {
            domain::error::DomainErrorKind::Invalid => {
                Status::invalid_argument("receiver and text must not be empty")
            }
            _ => {
                error!("failed to send message: {e}");
                Status::internal("failed to send message")
            }
        })?;

        Ok(Response::new(SendMessageResponse {
            message: Some(to_proto(&message)),
        }))
    }

    async fn get_messages(
        &self,
        request: Request<GetMessagesRequest>,
    ) -> Result<Response<GetMessagesResponse>, Status> {
        let user_id =
            authenticated_user_id(request.metadata(), self.app_state.config.jwt_secret())?;
        let req = request.into_inner();

        let messages = self
            .app_state
            .stores
            .messages
            .conversation(&user_id, &req.friend_id)
            .await;

        Ok(Response::new(GetMessagesResponse {
            messages: messages.iter().map(to_proto).collect(),
        }))
    }

    type StreamMessagesStream = MessageStream;

    async fn stream_messages(
        &self,
        request: Request<StreamMessagesRequest>,
    ) -> Result<Response<Self::StreamMessagesStream>, Status> {
        let user_id =
            authenticated_user_id(request.metadata(), self.app_state.config.jwt_secret())?;

        let hub = Arc::clone(&self.app_state.hub);
        let (stream_id, receiver) = hub.register_stream(user_id.clone()).await;
        info!("opened message stream for user {user_id}");

        Ok(Response::new(MessageStream::new(
            hub, user_id, stream_id, receiver,
        )))
    }
}

/// Extract and validate the bearer token from call metadata, returning the
/// authenticated user id. The `Bearer ` scheme prefix is optional, matching
/// what common gRPC clients send.
pub(crate) fn authenticated_user_id(metadata: &MetadataMap, secret: &str) -> Result<String, Status> {
    let token = metadata
        .get("authorization")
        .ok_or_else(|| Status::unauthenticated("missing authorization token"))?
        .to_str()
        .map_err(|_| Status::unauthenticated("malformed authorization token"))?;
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let claims = domain::jwt::validate_token(secret, token).map_err(|e| {
        debug!("rejecting call with invalid access token: {e}");
        Status::unauthenticated("invalid token")
    })?;
    Ok(claims.sub)
}

pub(crate) fn to_proto(message: &events::Message) -> ProtoMessage {
    ProtoMessage {
        id: message.id.to_string(),
        sender_id: message.sender_id.clone(),
        receiver_id: message.receiver_id.clone(),
        text: message.text.clone(),
        created_at: message.created_at.timestamp(),
    }
}

/// Serve the gRPC API on the configured port until `shutdown` resolves.
pub async fn start_server(
    app_state: AppState,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = format!(
        "{}:{}",
        app_state.config.interface, app_state.config.grpc_port
    )
    .parse()?;

    info!("gRPC server starting on {addr}");
    Server::builder()
        .add_service(WellnessServiceServer::new(WellnessRpc::new(app_state)))
        .serve_with_shutdown(addr, shutdown)
        .await?;

    Ok(())
}
