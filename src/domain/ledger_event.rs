//! Domain events emitted by the ledger.
//!
//! Every committed state change appends a [`LedgerEvent`] to the ledger's
//! journal as a [`RecordedEvent`]. Recorded events are then broadcast
//! through the [`super::EventBus`] to WebSocket subscribers and, when
//! enabled, to the PostgreSQL event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, Wei};

/// Notification emitted by a successful ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A participant staked the fixed amount.
    Staked {
        /// Staking participant.
        participant: Address,
        /// Amount accepted.
        amount: Wei,
        /// Round the stake belongs to.
        round: u64,
        /// Time the stake was accepted.
        timestamp: DateTime<Utc>,
    },

    /// The owner sent the pool to a recipient.
    FundsSent {
        /// Recipient of the pool.
        recipient: Address,
        /// Amount transferred.
        amount: Wei,
        /// Time of the distribution.
        timestamp: DateTime<Utc>,
    },

    /// The owner withdrew the pool to itself.
    Withdrawn {
        /// Owner address.
        owner: Address,
        /// Amount withdrawn.
        amount: Wei,
        /// Time of the withdrawal.
        timestamp: DateTime<Utc>,
    },

    /// The owner cleared the staked set and opened a new round.
    RoundReset {
        /// Newly opened round.
        round: u64,
        /// Number of participants cleared from the previous round.
        cleared: usize,
        /// Time of the reset.
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::Staked { .. } => "staked",
            Self::FundsSent { .. } => "funds_sent",
            Self::Withdrawn { .. } => "withdrawn",
            Self::RoundReset { .. } => "round_reset",
        }
    }

    /// Returns the address this event concerns, if any.
    #[must_use]
    pub const fn address(&self) -> Option<Address> {
        match self {
            Self::Staked { participant, .. } => Some(*participant),
            Self::FundsSent { recipient, .. } => Some(*recipient),
            Self::Withdrawn { owner, .. } => Some(*owner),
            Self::RoundReset { .. } => None,
        }
    }

    /// Returns the value moved by this event, if any.
    #[must_use]
    pub const fn amount(&self) -> Option<Wei> {
        match self {
            Self::Staked { amount, .. }
            | Self::FundsSent { amount, .. }
            | Self::Withdrawn { amount, .. } => Some(*amount),
            Self::RoundReset { .. } => None,
        }
    }
}

/// A journaled event with its position in the ledger's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Monotonic sequence number, starting at 1.
    pub sequence: u64,
    /// The event itself.
    #[serde(flatten)]
    pub event: LedgerEvent,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        if let Some(b) = bytes.last_mut() {
            *b = last;
        }
        Address::from_bytes(bytes)
    }

    #[test]
    fn staked_event_type_and_address() {
        let event = LedgerEvent::Staked {
            participant: addr(1),
            amount: Wei::new(200),
            round: 1,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "staked");
        assert_eq!(event.address(), Some(addr(1)));
        assert_eq!(event.amount(), Some(Wei::new(200)));
    }

    #[test]
    fn recorded_event_reads_back_from_json() {
        let recorded = RecordedEvent {
            sequence: 7,
            event: LedgerEvent::FundsSent {
                recipient: addr(3),
                amount: Wei::new(600),
                timestamp: Utc::now(),
            },
        };
        let Ok(json) = serde_json::to_value(&recorded) else {
            panic!("serialization failed");
        };
        assert_eq!(json["event_type"], "funds_sent");
        assert_eq!(json["sequence"], 7);

        let Ok(back) = serde_json::from_value::<RecordedEvent>(json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, recorded);
    }

    #[test]
    fn round_reset_has_no_address() {
        let event = LedgerEvent::RoundReset {
            round: 2,
            cleared: 3,
            timestamp: Utc::now(),
        };
        assert_eq!(event.address(), None);
        assert_eq!(event.amount(), None);
    }

    #[test]
    fn recorded_event_serializes_flat() {
        let recorded = RecordedEvent {
            sequence: 7,
            event: LedgerEvent::FundsSent {
                recipient: addr(3),
                amount: Wei::new(600),
                timestamp: Utc::now(),
            },
        };
        let json = serde_json::to_value(&recorded).unwrap_or_default();
        assert_eq!(json["sequence"], 7);
        assert_eq!(json["event_type"], "funds_sent");
        assert_eq!(json["amount"], "600");
        assert_eq!(
            json["recipient"],
            "0x0000000000000000000000000000000000000003"
        );
    }
}
