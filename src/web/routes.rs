use crate::error::{AppError, AppResult};
use crate::provision::ProvisioningParams;
use crate::service::BotFileService;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BotFileService>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Provisioning trigger: `?env=..&instance=..&endpoint=..`
///
/// Responds with the bot file URI as a JSON string. A query that cannot be
/// decoded is rejected like any other invalid parameter set.
pub async fn http_trigger(
    State(state): State<AppState>,
    query: Result<Query<ProvisioningParams>, QueryRejection>,
) -> AppResult<Json<String>> {
    let Query(params) = query.map_err(|e| {
        warn!("Rejected undecodable trigger query: {}", e.body_text());
        AppError::validation(format!("malformed query: {}", e.body_text()))
    })?;
    info!(
        "Bot file requested: env={:?} instance={:?}",
        params.env, params.instance
    );
    let location = state.service.handle(&params).await?;
    Ok(Json(location.uri))
}

/// Create the web router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/HttpTrigger", get(http_trigger).post(http_trigger))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
