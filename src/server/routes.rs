// src/server/routes.rs

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::error::HttpError;
use super::state::AppState;
use crate::store::IndexRow;

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeoutSetting {
    pub timeout_ms: u64,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/forecast/:selector", get(forecast_handler))
        .route("/portfolio", get(portfolio_handler))
        .route("/indices", get(indices_handler))
        .route("/health", get(health_handler))
        .route(
            "/runtime/timeout",
            get(get_timeout_handler).put(put_timeout_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Script payloads are passed through byte for byte.
fn payload_response(payload: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

/// GET /forecast/:selector
async fn forecast_handler(
    State(state): State<AppState>,
    Path(selector): Path<i64>,
) -> Result<Response, HttpError> {
    debug!(selector, policy = ?state.selector_policy, "forecast requested");
    let payload = state
        .forecast
        .forecast_selector(selector, state.selector_policy)
        .await?;
    Ok(payload_response(payload))
}

/// GET /portfolio
async fn portfolio_handler(State(state): State<AppState>) -> Result<Response, HttpError> {
    let payload = state.portfolio.optimize().await?;
    Ok(payload_response(payload))
}

/// GET /indices
async fn indices_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<IndexRow>>, HttpError> {
    let rows = state.store.load_all().await.map_err(HttpError::Store)?;
    Ok(Json(rows))
}

/// GET /health
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /runtime/timeout
async fn get_timeout_handler(State(state): State<AppState>) -> Json<TimeoutSetting> {
    Json(TimeoutSetting {
        timeout_ms: state.environment.timeout().as_millis() as u64,
    })
}

/// PUT /runtime/timeout
async fn put_timeout_handler(
    State(state): State<AppState>,
    Json(req): Json<TimeoutSetting>,
) -> Result<Json<TimeoutSetting>, HttpError> {
    state
        .environment
        .set_timeout(Duration::from_millis(req.timeout_ms))
        .map_err(|e| HttpError::BadRequest(e.to_string()))?;
    Ok(Json(req))
}
