//! Service layer: business logic orchestration.
//!
//! [`LedgerService`] serializes access to the escrow ledger, executes
//! payouts through the treasury, and emits events through the
//! [`super::domain::EventBus`].

pub mod ledger_service;

pub use ledger_service::{LedgerService, StakeReceipt};
