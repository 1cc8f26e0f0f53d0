use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use log::*;

use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::activity::PostActivityParams;
use crate::Error;
use domain::activity;
use service::AppState;

/// POST record an activity and notify friends
#[utoipa::path(
    post,
    path = "/api/wellness/activities",
    request_body = PostActivityParams,
    responses(
        (status = 201, description = "Successfully posted a new activity"),
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
    Json(params): Json<PostActivityParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST new {} activity", params.kind);

    let posted = activity::post_activity(
        &app_state.stores.activities,
        &app_state.stores.friends,
        app_state.hub_ref(),
        user_id,
        params.kind,
        params.description,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.as_u16(), posted)),
    ))
}

/// GET friends' recent activity feed
#[utoipa::path(
    get,
    path = "/api/wellness/activities",
    responses(
        (status = 200, description = "Successfully retrieved the friends activity feed"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let feed = activity::friends_feed(
        &app_state.stores.activities,
        &app_state.stores.friends,
        &user_id,
    )
    .await;

    Ok(Json(ApiResponse::new(StatusCode::OK.as_u16(), feed)))
}
