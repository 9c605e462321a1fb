//! Database models for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RecordedEvent;
use crate::error::EscrowError;

/// A stored row from the `ledger_events` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredEvent {
    /// Journal sequence number of the event.
    pub sequence: i64,
    /// Event type discriminator (e.g. `"staked"`).
    pub event_type: String,
    /// JSONB payload with the full recorded event.
    pub payload: serde_json::Value,
    /// Server-side insertion timestamp.
    pub created_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Decodes the payload back into the event it was written from.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::CorruptJournal`] if the payload does not
    /// decode or disagrees with the row's sequence or type.
    pub fn into_recorded(self) -> Result<RecordedEvent, EscrowError> {
        let row = self.sequence;
        let recorded: RecordedEvent = serde_json::from_value(self.payload)
            .map_err(|e| EscrowError::CorruptJournal(format!("row {row}: {e}")))?;

        if i64::try_from(recorded.sequence).ok() != Some(row) {
            return Err(EscrowError::CorruptJournal(format!(
                "row {row} holds event {}",
                recorded.sequence
            )));
        }
        if recorded.event.event_type_str() != self.event_type {
            return Err(EscrowError::CorruptJournal(format!(
                "row {row} is typed {} but holds {}",
                self.event_type,
                recorded.event.event_type_str()
            )));
        }
        Ok(recorded)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Address, LedgerEvent, Wei};

    fn recorded(sequence: u64) -> RecordedEvent {
        RecordedEvent {
            sequence,
            event: LedgerEvent::Staked {
                participant: Address::from_bytes([7u8; 20]),
                amount: Wei::new(200),
                round: 1,
                timestamp: Utc::now(),
            },
        }
    }

    fn row(sequence: i64, event_type: &str, event: &RecordedEvent) -> StoredEvent {
        StoredEvent {
            sequence,
            event_type: event_type.to_string(),
            payload: serde_json::to_value(event).unwrap_or_default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_decodes_to_its_event() {
        let event = recorded(4);
        let Ok(back) = row(4, "staked", &event).into_recorded() else {
            panic!("row should decode");
        };
        assert_eq!(back, event);
    }

    #[test]
    fn mismatched_sequence_is_corrupt() {
        let result = row(5, "staked", &recorded(4)).into_recorded();
        assert!(matches!(result, Err(EscrowError::CorruptJournal(_))));
    }

    #[test]
    fn mismatched_type_is_corrupt() {
        let result = row(4, "funds_sent", &recorded(4)).into_recorded();
        assert!(matches!(result, Err(EscrowError::CorruptJournal(_))));
    }

    #[test]
    fn garbage_payload_is_corrupt() {
        let stored = StoredEvent {
            sequence: 1,
            event_type: "staked".to_string(),
            payload: serde_json::json!({ "sequence": 1, "event_type": "staked" }),
            created_at: Utc::now(),
        };
        assert!(matches!(
            stored.into_recorded(),
            Err(EscrowError::CorruptJournal(_))
        ));
    }
}
