//! HTTP transport for the wellness platform: the router, bearer-token
//! extraction, the wellness controllers that originate realtime events, and
//! the WebSocket endpoint that feeds the hub's connection registry.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::Router;
use service::config::Config;
use service::AppState;
use tower_http::cors::{Any, CorsLayer};

pub(crate) mod controller;
pub(crate) mod extractors;
pub(crate) mod params;
pub mod router;
pub(crate) mod ws;

mod error;

pub use error::{Error, Result};

/// Build the application router with CORS applied from configuration.
pub fn init_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);
    router::define_routes(app_state).layer(cors)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
