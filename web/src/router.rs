use crate::controller::{
    activity_controller, challenge_controller, health_check_controller, message_controller,
};
use crate::ws;
use axum::routing::{get, post};
use axum::Router;
use service::AppState;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Wellness Platform API"
        ),
        paths(
            health_check_controller::health_check,
            message_controller::create,
            message_controller::index,
            activity_controller::create,
            activity_controller::index,
            challenge_controller::create,
            challenge_controller::join,
            challenge_controller::index,
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "wellness_platform", description = "Wellness realtime chat & activity API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our JWT bearer token authentication requirement for gaining access
// to our API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(message_routes(app_state.clone()))
        .merge(activity_routes(app_state.clone()))
        .merge(challenge_routes(app_state.clone()))
        .merge(ws_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn message_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/wellness/messages", post(message_controller::create))
        .route(
            "/api/wellness/messages/:friend_id",
            get(message_controller::index),
        )
        .with_state(app_state)
}

fn activity_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/wellness/activities",
            post(activity_controller::create),
        )
        .route("/api/wellness/activities", get(activity_controller::index))
        .with_state(app_state)
}

fn challenge_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/wellness/challenges",
            post(challenge_controller::create),
        )
        .route(
            "/api/wellness/challenges",
            get(challenge_controller::index),
        )
        .route(
            "/api/wellness/challenges/:id/join",
            post(challenge_controller::join),
        )
        .with_state(app_state)
}

// The upgrade handlers authenticate themselves via query token, so these
// routes sit outside the bearer-header extractor.
fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/wellness/ws", get(ws::handler::ws_upgrade))
        .route("/api/wellness/ws/activity", get(ws::handler::ws_upgrade))
        .with_state(app_state)
}
