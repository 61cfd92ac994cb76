//! Axum router wiring.
//!
//! Pages, session creation, the per-session WebSocket endpoint, and the ops
//! endpoints. Anything else falls through to the uniform 404 page; error
//! responses get their HTML body from `web::error::render_error_pages`.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{app_state::AppState, ops, transport, web};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(web::handlers::home))
        .route("/session/create", post(web::handlers::create_session))
        .route("/session/:token", get(web::handlers::show_session))
        .route("/ws/:token", get(transport::ws::ws_upgrade))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .fallback(web::handlers::not_found)
        .layer(middleware::map_response_with_state(
            state.clone(),
            web::error::render_error_pages,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
