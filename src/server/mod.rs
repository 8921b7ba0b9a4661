pub mod handlers;
pub mod limits;
pub mod types;

use crate::server::handlers::{
    convert_handler, index_handler, script_handler, server_status_handler,
};
use crate::server::limits::payload_too_large;
use crate::server::types::AppState;
use axum::extract::DefaultBodyLimit;
use axum::middleware::map_response_with_state;
use axum::{Router, routing::get, routing::post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.config.max_content_length;
    let limit_mb = state.config.max_content_length_mb();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_body_limit = RequestBodyLimitLayer::new(limit);

    Router::new()
        .route("/", get(index_handler))
        .route("/status", get(server_status_handler))
        .route("/static/script.js", get(script_handler))
        .route("/convert", post(convert_handler))
        // the tower-http limit below replaces axum's 2MB default
        .layer(DefaultBodyLimit::disable())
        .layer(request_body_limit)
        .layer(map_response_with_state(limit_mb, payload_too_large))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
