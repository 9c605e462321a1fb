//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::auth::OwnerKey;
use crate::domain::EventBus;
use crate::service::LedgerService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ledger service for all business logic.
    pub ledger_service: Arc<LedgerService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Credential required by owner-gated endpoints.
    pub owner_key: OwnerKey,
}

impl AppState {
    /// Builds state around `ledger_service`, sharing its event bus.
    #[must_use]
    pub fn new(ledger_service: Arc<LedgerService>, owner_key: OwnerKey) -> Self {
        let event_bus = ledger_service.event_bus().clone();
        Self {
            ledger_service,
            event_bus,
            owner_key,
        }
    }
}
