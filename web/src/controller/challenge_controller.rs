use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use log::*;

use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::challenge::CreateChallengeParams;
use crate::Error;
use domain::challenge;
use events::Id;
use service::AppState;

/// POST create a new challenge
#[utoipa::path(
    post,
    path = "/api/wellness/challenges",
    request_body = CreateChallengeParams,
    responses(
        (status = 201, description = "Successfully created a new challenge"),
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
    Json(params): Json<CreateChallengeParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST new challenge: {}", params.name);

    let created = challenge::create_challenge(
        &app_state.stores.challenges,
        &app_state.stores.friends,
        app_state.hub_ref(),
        user_id,
        params.name,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.as_u16(), created)),
    ))
}

/// POST join an existing challenge
#[utoipa::path(
    post,
    path = "/api/wellness/challenges/{id}/join",
    params(
        ("id" = String, Path, description = "Challenge id to join")
    ),
    responses(
        (status = 200, description = "Successfully joined the challenge"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn join(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST join challenge {id}");

    let joined = challenge::join_challenge(
        &app_state.stores.challenges,
        app_state.hub_ref(),
        user_id,
        id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.as_u16(), joined)))
}

/// GET list all challenges
#[utoipa::path(
    get,
    path = "/api/wellness/challenges",
    responses(
        (status = 200, description = "Successfully listed challenges"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(_user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let challenges = app_state.stores.challenges.list().await;
    Ok(Json(ApiResponse::new(StatusCode::OK.as_u16(), challenges)))
}
