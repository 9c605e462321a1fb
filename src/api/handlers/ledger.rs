//! Read-only ledger handlers: state, lobby, event history.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{EventListResponse, EventsQuery, LedgerStateResponse, ParticipantsResponse};
use crate::app_state::AppState;

/// `GET /ledger` — Current ledger state.
#[utoipa::path(
    get,
    path = "/api/v1/ledger",
    tag = "Ledger",
    summary = "Ledger state",
    description = "Returns owner, stake amount, policy, balance, round, and lifetime totals.",
    responses(
        (status = 200, description = "Ledger state", body = LedgerStateResponse),
    )
)]
pub async fn get_ledger(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.ledger_service.state().await;
    Json(LedgerStateResponse::from(view))
}

/// `GET /participants` — Stakes accepted in the current round.
#[utoipa::path(
    get,
    path = "/api/v1/participants",
    tag = "Ledger",
    summary = "Current lobby",
    description = "Returns one entry per stake accepted in the current round, in acceptance order.",
    responses(
        (status = 200, description = "Lobby membership", body = ParticipantsResponse),
    )
)]
pub async fn list_participants(State(state): State<AppState>) -> impl IntoResponse {
    let (round, participants) = state.ledger_service.participants().await;

    Json(ParticipantsResponse {
        round,
        count: participants.len(),
        participants,
    })
}

/// `GET /events` — Journaled events after a cursor.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Ledger",
    summary = "Event history",
    description = "Returns journaled events with a sequence number greater than `after`, oldest first.",
    params(EventsQuery),
    responses(
        (status = 200, description = "Event page", body = EventListResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> impl IntoResponse {
    let params = params.clamped();
    let data = state
        .ledger_service
        .events_after(params.after, params.limit)
        .await;
    let next_after = data.last().map_or(params.after, |e| e.sequence);

    Json(EventListResponse { data, next_after })
}

/// Ledger read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledger", get(get_ledger))
        .route("/participants", get(list_participants))
        .route("/events", get(list_events))
}
