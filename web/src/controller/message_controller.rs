use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use log::*;

use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::message::SendMessageParams;
use crate::Error;
use domain::chat;
use service::AppState;

/// POST send a chat message to another user
#[utoipa::path(
    post,
    path = "/api/wellness/messages",
    request_body = SendMessageParams,
    responses(
        (status = 201, description = "Successfully sent a new chat message"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 500, description = "Internal Server Error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<SendMessageParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST new chat message to {}", params.receiver_id);

    let message = chat::send_message(
        &app_state.stores.messages,
        app_state.hub_ref(),
        user_id,
        params.receiver_id,
        params.text,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.as_u16(), message)),
    ))
}

/// GET conversation history with a friend
#[utoipa::path(
    get,
    path = "/api/wellness/messages/{friend_id}",
    params(
        ("friend_id" = String, Path, description = "User id of the other side of the conversation")
    ),
    responses(
        (status = 200, description = "Successfully retrieved conversation history"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(friend_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET conversation history with {friend_id}");

    let messages = app_state
        .stores
        .messages
        .conversation(&user_id, &friend_id)
        .await;

    Ok(Json(ApiResponse::new(StatusCode::OK.as_u16(), messages)))
}
