//! Ledger state, lobby, and event history DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Address, LedgerView, RecordedEvent, StakePolicy, Wei};

/// Response body for `GET /ledger`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerStateResponse {
    /// Ledger owner.
    #[schema(value_type = String)]
    pub owner: Address,
    /// Fixed stake amount (string-encoded).
    #[schema(value_type = String)]
    pub stake_amount: Wei,
    /// Duplicate-stake policy (`unique` or `unlimited`).
    #[schema(value_type = String)]
    pub policy: StakePolicy,
    /// Value currently held (string-encoded).
    #[schema(value_type = String)]
    pub balance: Wei,
    /// Current round.
    pub round: u64,
    /// Stakes accepted in the current round.
    pub participant_count: usize,
    /// Lifetime value accepted (string-encoded).
    #[schema(value_type = String)]
    pub total_staked: Wei,
    /// Lifetime value paid out (string-encoded).
    #[schema(value_type = String)]
    pub total_distributed: Wei,
    /// Latest event sequence number.
    pub last_sequence: u64,
}

impl From<LedgerView> for LedgerStateResponse {
    fn from(view: LedgerView) -> Self {
        Self {
            owner: view.owner,
            stake_amount: view.stake_amount,
            policy: view.policy,
            balance: view.balance,
            round: view.round,
            participant_count: view.participant_count,
            total_staked: view.total_staked,
            total_distributed: view.total_distributed,
            last_sequence: view.last_sequence,
        }
    }
}

/// Response body for `GET /participants`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantsResponse {
    /// Current round.
    pub round: u64,
    /// One entry per accepted stake, in acceptance order.
    #[schema(value_type = Vec<String>)]
    pub participants: Vec<Address>,
    /// Number of entries.
    pub count: usize,
}

/// Response body for `GET /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events in sequence order.
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<RecordedEvent>,
    /// Cursor to pass as `after` for the next page.
    pub next_after: u64,
}
