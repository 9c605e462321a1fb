//! Domain layer: core types, escrow ledger, and event system.
//!
//! This module contains the escrow domain model: account identity and
//! amounts, the ledger state machine with its event journal, the treasury
//! seam for outgoing value, and the event bus for broadcasting committed
//! events.

pub mod address;
pub mod event_bus;
pub mod ledger;
pub mod ledger_event;
pub mod treasury;
pub mod wei;

pub use address::Address;
pub use event_bus::EventBus;
pub use ledger::{
    Checkpoint, DEFAULT_JOURNAL_CAPACITY, Ledger, LedgerView, Settlement, StakePolicy, Transfer,
};
pub use ledger_event::{LedgerEvent, RecordedEvent};
pub use treasury::{InMemoryTreasury, Treasury};
pub use wei::Wei;
