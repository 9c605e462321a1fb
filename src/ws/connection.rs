//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered ledger events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::LedgerStateResponse;
use crate::domain::{Address, RecordedEvent};
use crate::service::LedgerService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<RecordedEvent>,
    ledger_service: Arc<LedgerService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &ledger_service).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(recorded) => {
                        if subs.matches(&recorded.event) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&recorded).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON
/// response.
pub async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    ledger_service: &LedgerService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON")).ok();
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let reply = match command {
        WsCommand::Subscribe { addresses } => {
            let (parsed, wildcard) = parse_addresses(&addresses);
            subs.subscribe(&parsed, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": parsed.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { addresses } => {
            let (parsed, wildcard) = parse_addresses(&addresses);
            subs.unsubscribe(&parsed, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": parsed.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::GetState => {
            let state = LedgerStateResponse::from(ledger_service.state().await);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::to_value(&state).unwrap_or_default(),
            )
        }
        WsCommand::VerifyStake { address } => {
            let Ok(parsed) = address.parse::<Address>() else {
                return serde_json::to_string(&WsMessage::error(msg.id, 400, "invalid address"))
                    .ok();
            };
            match ledger_service.verify_stake(parsed).await {
                Ok((staked, round)) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::json!({ "address": parsed, "staked": staked, "round": round }),
                ),
                Err(err) => WsMessage::error(msg.id, err.error_code(), &err.to_string()),
            }
        }
    };

    serde_json::to_string(&reply).ok()
}

/// Splits a client address list into parsed addresses and the wildcard
/// flag. Unparseable entries are skipped.
fn parse_addresses(raw: &[String]) -> (Vec<Address>, bool) {
    let mut wildcard = false;
    let mut parsed = Vec::with_capacity(raw.len());
    for s in raw {
        if s == "*" {
            wildcard = true;
        } else if let Ok(address) = s.parse::<Address>() {
            parsed.push(address);
        }
    }
    (parsed, wildcard)
}
