//! System endpoints: health check, ledger configuration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Static ledger parameters.
#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerConfigInfo {
    owner: String,
    stake_amount: String,
    policy: &'static str,
    verify_stake_available: bool,
}

/// `GET /config/ledger` — Fixed ledger parameters.
#[utoipa::path(
    get,
    path = "/config/ledger",
    tag = "System",
    summary = "Ledger parameters",
    description = "Returns the owner, the fixed stake amount, and the duplicate-stake policy.",
    responses(
        (status = 200, description = "Ledger parameters", body = LedgerConfigInfo),
    )
)]
pub async fn ledger_config_handler(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.ledger_service.state().await;
    (
        StatusCode::OK,
        Json(LedgerConfigInfo {
            owner: view.owner.to_string(),
            stake_amount: view.stake_amount.to_string(),
            policy: view.policy.as_str(),
            verify_stake_available: view.policy == crate::domain::StakePolicy::Unique,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/ledger", get(ledger_config_handler))
}
