//! Owner-gated handlers: withdraw, send funds, reset round.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::auth::OwnerAuth;
use crate::api::dto::{
    CallerRequest, DistributionResponse, RoundResetResponse, SendFundsRequest, parse_address,
};
use crate::app_state::AppState;
use crate::domain::LedgerEvent;
use crate::error::{ErrorResponse, EscrowError};

/// `POST /withdraw` — Move the whole pool to the owner.
///
/// # Errors
///
/// Returns [`EscrowError::Unauthorized`] without the owner key and
/// [`EscrowError::NotOwner`] when the caller is not the owner.
#[utoipa::path(
    post,
    path = "/api/v1/withdraw",
    tag = "Distributions",
    summary = "Withdraw the pool to the owner",
    description = "Transfers the entire balance to the owner. An empty balance succeeds with amount \"0\".",
    request_body = CallerRequest,
    security(("owner_key" = [])),
    responses(
        (status = 200, description = "Pool withdrawn", body = DistributionResponse),
        (status = 400, description = "Malformed caller address", body = ErrorResponse),
        (status = 401, description = "Missing or invalid owner key", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 502, description = "Payout rejected by the treasury", body = ErrorResponse),
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    _owner: OwnerAuth,
    Json(req): Json<CallerRequest>,
) -> Result<impl IntoResponse, EscrowError> {
    let caller = parse_address("caller", &req.caller)?;
    let amount = state.ledger_service.withdraw(caller).await?;

    Ok(Json(DistributionResponse {
        recipient: caller,
        amount,
        executed_at: Utc::now(),
    }))
}

/// `POST /distributions` — Send the whole pool to a recipient.
///
/// # Errors
///
/// Returns [`EscrowError::Unauthorized`], [`EscrowError::NotOwner`],
/// [`EscrowError::InvalidRecipient`], or [`EscrowError::EmptyBalance`].
#[utoipa::path(
    post,
    path = "/api/v1/distributions",
    tag = "Distributions",
    summary = "Send the pool to a recipient",
    description = "Transfers the entire balance to `recipient`, typically the winner chosen off-chain, and emits a `funds_sent` event.",
    request_body = SendFundsRequest,
    security(("owner_key" = [])),
    responses(
        (status = 200, description = "Pool distributed", body = DistributionResponse),
        (status = 400, description = "Malformed address or zero recipient", body = ErrorResponse),
        (status = 401, description = "Missing or invalid owner key", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 409, description = "Nothing to distribute", body = ErrorResponse),
        (status = 502, description = "Payout rejected by the treasury", body = ErrorResponse),
    )
)]
pub async fn send_funds_to(
    State(state): State<AppState>,
    _owner: OwnerAuth,
    Json(req): Json<SendFundsRequest>,
) -> Result<impl IntoResponse, EscrowError> {
    let caller = parse_address("caller", &req.caller)?;
    let recipient = parse_address("recipient", &req.recipient)?;
    let amount = state.ledger_service.send_funds_to(caller, recipient).await?;

    Ok(Json(DistributionResponse {
        recipient,
        amount,
        executed_at: Utc::now(),
    }))
}

/// `POST /rounds/reset` — Clear the staked set and open a new round.
///
/// # Errors
///
/// Returns [`EscrowError::Unauthorized`], [`EscrowError::NotOwner`], or
/// [`EscrowError::RoundInProgress`].
#[utoipa::path(
    post,
    path = "/api/v1/rounds/reset",
    tag = "Distributions",
    summary = "Open a new round",
    description = "Clears the staked set so previous participants can stake again. Only allowed once the pool is empty.",
    request_body = CallerRequest,
    security(("owner_key" = [])),
    responses(
        (status = 200, description = "Round reset", body = RoundResetResponse),
        (status = 401, description = "Missing or invalid owner key", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 409, description = "Pool not yet settled", body = ErrorResponse),
    )
)]
pub async fn reset_round(
    State(state): State<AppState>,
    _owner: OwnerAuth,
    Json(req): Json<CallerRequest>,
) -> Result<impl IntoResponse, EscrowError> {
    let caller = parse_address("caller", &req.caller)?;
    let recorded = state.ledger_service.reset_round(caller).await?;
    let LedgerEvent::RoundReset { round, cleared, .. } = recorded.event else {
        return Err(EscrowError::Internal(
            "reset journaled an unexpected event".to_string(),
        ));
    };

    Ok(Json(RoundResetResponse {
        round,
        cleared,
        sequence: recorded.sequence,
    }))
}

/// Owner-gated routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/withdraw", post(withdraw))
        .route("/distributions", post(send_funds_to))
        .route("/rounds/reset", post(reset_round))
}
