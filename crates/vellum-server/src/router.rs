use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::files::file_handler;
use crate::handler::health_handler;
use crate::page::page_handler;
use crate::revalidate::{revalidate_handler, webhook_handler};
use crate::state::AppState;

/// Build the axum router with all Vellum endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/files/*path", get(file_handler))
        .route("/revalidate", post(revalidate_handler))
        .route("/webhook", post(webhook_handler))
        .route("/v1/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
