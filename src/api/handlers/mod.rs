//! REST endpoint handlers organized by resource.

pub mod distribution;
pub mod ledger;
pub mod stake;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(stake::routes())
        .merge(distribution::routes())
        .merge(ledger::routes())
}
