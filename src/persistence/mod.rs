//! Persistence layer: PostgreSQL event log.
//!
//! Committed ledger events are mirrored into the `ledger_events` table by a
//! background recorder subscribed to the [`EventBus`](crate::domain::EventBus).
//! The in-memory ledger stays authoritative; the table is an audit trail.

pub mod models;
pub mod postgres;
pub mod recorder;

pub use models::StoredEvent;
pub use postgres::PostgresPersistence;
pub use recorder::spawn_event_recorder;
