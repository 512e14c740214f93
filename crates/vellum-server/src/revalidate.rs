//! Explicit invalidation of the composed page.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use tracing::info;
use vellum_types::format_timestamp;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub revalidated: bool,
    pub timestamp: String,
}

/// `POST /revalidate`: manual refresh.
pub async fn revalidate_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<RevalidateResponse>> {
    let at = state.cache.invalidate().map_err(ServerError::Revalidate)?;
    info!(source = "manual", "page revalidated");
    Ok(Json(RevalidateResponse {
        revalidated: true,
        timestamp: format_timestamp(&at),
    }))
}

/// `POST /webhook`: refresh triggered by an ingestion event. The request
/// body is accepted and ignored.
pub async fn webhook_handler(State(state): State<AppState>) -> ServerResult<Json<WebhookResponse>> {
    let at = state.cache.invalidate().map_err(ServerError::Webhook)?;
    info!(source = "webhook", "page revalidated");
    Ok(Json(WebhookResponse {
        success: true,
        revalidated: true,
        timestamp: format_timestamp(&at),
    }))
}
