//! Stake DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Address, Wei};

/// Request body for `POST /stakes`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StakeRequest {
    /// Staking participant (`0x` + 40 hex digits).
    pub participant: String,
    /// Offered amount in wei (string-encoded u128). Must equal the fixed
    /// stake exactly.
    pub amount: String,
}

/// Response body for `POST /stakes` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct StakeResponse {
    /// Staking participant.
    #[schema(value_type = String)]
    pub participant: Address,
    /// Accepted amount (string-encoded).
    #[schema(value_type = String)]
    pub amount: Wei,
    /// Round the stake belongs to.
    pub round: u64,
    /// Event sequence number of the `staked` event.
    pub sequence: u64,
    /// Pool balance after the stake (string-encoded).
    #[schema(value_type = String)]
    pub balance: Wei,
    /// Acceptance timestamp.
    pub staked_at: DateTime<Utc>,
}

/// Response body for `GET /stakes/{address}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyStakeResponse {
    /// Queried address.
    #[schema(value_type = String)]
    pub address: Address,
    /// Whether the address staked in the current round.
    pub staked: bool,
    /// Current round.
    pub round: u64,
}
