//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams committed ledger events to
//! subscribers and answers read-only commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
