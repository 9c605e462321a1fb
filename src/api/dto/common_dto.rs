//! Shared DTO types used across multiple endpoints.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::Address;
use crate::error::EscrowError;

/// Maximum number of events returned per page.
pub const MAX_EVENTS_PER_PAGE: usize = 500;

/// Request body for owner-gated calls that take no other input.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CallerRequest {
    /// Address of the transacting caller.
    pub caller: String,
}

/// Cursor parameters for `GET /events`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Return events with a sequence number strictly greater than this.
    /// Defaults to 0 (from the beginning).
    #[serde(default)]
    pub after: u64,
    /// Maximum number of events (1–500). Defaults to 100.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

impl EventsQuery {
    /// Clamps `limit` to the allowed range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            after: self.after,
            limit: self.limit.clamp(1, MAX_EVENTS_PER_PAGE),
        }
    }
}

/// Parses an address supplied in the named request field.
///
/// # Errors
///
/// Returns [`EscrowError::InvalidAddress`] naming the field and value.
pub fn parse_address(field: &str, value: &str) -> Result<Address, EscrowError> {
    value
        .parse()
        .map_err(|_| EscrowError::InvalidAddress(format!("{field}: {value}")))
}
