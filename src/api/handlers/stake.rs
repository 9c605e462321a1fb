//! Stake handlers: stake, verify stake.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{StakeRequest, StakeResponse, VerifyStakeResponse, parse_address};
use crate::app_state::AppState;
use crate::domain::{LedgerEvent, Wei};
use crate::error::{ErrorResponse, EscrowError};

/// `POST /stakes` — Stake the fixed amount.
///
/// # Errors
///
/// Returns [`EscrowError`] on a malformed address or amount, a wrong
/// amount, or a duplicate stake.
#[utoipa::path(
    post,
    path = "/api/v1/stakes",
    tag = "Stakes",
    summary = "Stake the fixed amount",
    description = "Deposits exactly the fixed stake amount on behalf of `participant`. Partial or over-payment is rejected outright.",
    request_body = StakeRequest,
    responses(
        (status = 201, description = "Stake accepted", body = StakeResponse),
        (status = 400, description = "Malformed input or wrong amount", body = ErrorResponse),
        (status = 409, description = "Participant already staked this round", body = ErrorResponse),
    )
)]
pub async fn stake(
    State(state): State<AppState>,
    Json(req): Json<StakeRequest>,
) -> Result<impl IntoResponse, EscrowError> {
    let participant = parse_address("participant", &req.participant)?;
    let amount: Wei = req.amount.parse()?;

    let receipt = state.ledger_service.stake(participant, amount).await?;
    let LedgerEvent::Staked {
        round, timestamp, ..
    } = receipt.event.event
    else {
        return Err(EscrowError::Internal(
            "stake journaled an unexpected event".to_string(),
        ));
    };

    let response = StakeResponse {
        participant,
        amount,
        round,
        sequence: receipt.event.sequence,
        balance: receipt.balance,
        staked_at: timestamp,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /stakes/{address}` — Check whether an address staked this round.
///
/// # Errors
///
/// Returns [`EscrowError::InvalidAddress`] for a malformed address and
/// [`EscrowError::StakeTrackingDisabled`] under the unlimited policy.
#[utoipa::path(
    get,
    path = "/api/v1/stakes/{address}",
    tag = "Stakes",
    summary = "Verify a stake",
    description = "Returns whether the address is in the current round's staked set.",
    params(
        ("address" = String, Path, description = "Account address (0x + 40 hex digits)"),
    ),
    responses(
        (status = 200, description = "Stake status", body = VerifyStakeResponse),
        (status = 400, description = "Malformed address", body = ErrorResponse),
        (status = 404, description = "Stake tracking disabled", body = ErrorResponse),
    )
)]
pub async fn verify_stake(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, EscrowError> {
    let address = parse_address("address", &address)?;
    let (staked, round) = state.ledger_service.verify_stake(address).await?;

    Ok(Json(VerifyStakeResponse {
        address,
        staked,
        round,
    }))
}

/// Stake routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stakes", post(stake))
        .route("/stakes/{address}", get(verify_stake))
}
