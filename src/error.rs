//! Escrow error types with HTTP status code mapping.
//!
//! [`EscrowError`] is the central error type. Every ledger rejection maps
//! to a specific HTTP status code and a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Address, Wei};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1003,
///     "message": "wrong stake amount: expected 200000000000000, got 1",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Escrow error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                         |
/// |-----------|-------------------|-------------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request                     |
/// | 2000–2999 | Authorization / State | 401 / 403 / 404 / 409 Conflict |
/// | 3000–3999 | Server            | 500 / 502                           |
#[derive(Debug, thiserror::Error)]
pub enum EscrowError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Address string is not `0x` followed by 40 hex digits.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Staked amount differs from the fixed stake.
    #[error("wrong stake amount: expected {expected}, got {actual}")]
    WrongAmount {
        /// Fixed stake amount.
        expected: Wei,
        /// Amount offered by the caller.
        actual: Wei,
    },

    /// Distribution target is the zero address.
    #[error("invalid recipient: zero address")]
    InvalidRecipient,

    /// Owner-gated request without valid owner credentials.
    #[error("missing or invalid owner credentials")]
    Unauthorized,

    /// Caller is not the ledger owner.
    #[error("caller {0} is not the owner")]
    NotOwner(Address),

    /// Caller already staked in the current round.
    #[error("{0} has already staked")]
    AlreadyStaked(Address),

    /// Nothing to distribute.
    #[error("ledger balance is empty")]
    EmptyBalance,

    /// Round cannot be reset while the pool still holds value.
    #[error("round still holds {0}; settle before resetting")]
    RoundInProgress(Wei),

    /// Stake membership is not tracked under the active policy.
    #[error("stake tracking is disabled under the unlimited policy")]
    StakeTrackingDisabled,

    /// Checked arithmetic overflowed or underflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// External value transfer was rejected.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// Stored event history cannot be replayed into a consistent ledger.
    #[error("corrupt journal: {0}")]
    CorruptJournal(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EscrowError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidAddress(_) => 1002,
            Self::WrongAmount { .. } => 1003,
            Self::InvalidRecipient => 1004,
            Self::NotOwner(_) => 2001,
            Self::AlreadyStaked(_) => 2002,
            Self::EmptyBalance => 2003,
            Self::RoundInProgress(_) => 2004,
            Self::StakeTrackingDisabled => 2005,
            Self::Unauthorized => 2006,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::ArithmeticOverflow => 3002,
            Self::TransferFailed(_) => 3003,
            Self::CorruptJournal(_) => 3004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidAddress(_)
            | Self::WrongAmount { .. }
            | Self::InvalidRecipient => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotOwner(_) => StatusCode::FORBIDDEN,
            Self::StakeTrackingDisabled => StatusCode::NOT_FOUND,
            Self::AlreadyStaked(_) | Self::EmptyBalance | Self::RoundInProgress(_) => {
                StatusCode::CONFLICT
            }
            Self::TransferFailed(_) => StatusCode::BAD_GATEWAY,
            Self::ArithmeticOverflow
            | Self::CorruptJournal(_)
            | Self::PersistenceError(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EscrowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<sqlx::Error> for EscrowError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn ledger_rejections_map_to_client_errors() {
        let cases = [
            (EscrowError::InvalidRecipient, StatusCode::BAD_REQUEST),
            (EscrowError::Unauthorized, StatusCode::UNAUTHORIZED),
            (EscrowError::NotOwner(Address::ZERO), StatusCode::FORBIDDEN),
            (EscrowError::AlreadyStaked(Address::ZERO), StatusCode::CONFLICT),
            (EscrowError::EmptyBalance, StatusCode::CONFLICT),
            (EscrowError::StakeTrackingDisabled, StatusCode::NOT_FOUND),
            (
                EscrowError::WrongAmount {
                    expected: Wei::new(2),
                    actual: Wei::new(1),
                },
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn wrong_amount_message_names_both_amounts() {
        let err = EscrowError::WrongAmount {
            expected: Wei::new(200),
            actual: Wei::new(1),
        };
        assert_eq!(err.to_string(), "wrong stake amount: expected 200, got 1");
        assert_eq!(err.error_code(), 1003);
    }

    #[test]
    fn into_response_sets_status() {
        let response = EscrowError::EmptyBalance.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
