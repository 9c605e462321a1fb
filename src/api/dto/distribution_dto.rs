//! Withdrawal, distribution, and round reset DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Address, Wei};

/// Request body for `POST /distributions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendFundsRequest {
    /// Address of the transacting caller. Must be the owner.
    pub caller: String,
    /// Recipient of the whole pool, typically the round's winner.
    pub recipient: String,
}

/// Response body for `POST /distributions` and `POST /withdraw`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DistributionResponse {
    /// Address that received the pool.
    #[schema(value_type = String)]
    pub recipient: Address,
    /// Amount transferred (string-encoded). Zero for an empty withdrawal.
    #[schema(value_type = String)]
    pub amount: Wei,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}

/// Response body for `POST /rounds/reset`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundResetResponse {
    /// Newly opened round.
    pub round: u64,
    /// Participants cleared from the previous round.
    pub cleared: usize,
    /// Event sequence number of the `round_reset` event.
    pub sequence: u64,
}
