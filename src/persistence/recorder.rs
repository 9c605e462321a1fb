//! Background task that mirrors bus events into the event log.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::postgres::PostgresPersistence;
use crate::domain::RecordedEvent;
use crate::service::LedgerService;

/// Events fetched from the in-memory journal per backfill query.
const BACKFILL_BATCH: usize = 500;

/// Spawns a task that writes every event published by `ledger_service` to
/// `persistence`.
///
/// Events are written strictly in sequence order; the ledger never waits on
/// the database. A failed write is logged and retried from the in-memory
/// journal when the next event arrives, as is any range missed by lagging
/// behind the bus. The task ends when the bus closes.
pub fn spawn_event_recorder(
    ledger_service: Arc<LedgerService>,
    persistence: PostgresPersistence,
) -> JoinHandle<()> {
    let mut rx = ledger_service.event_bus().subscribe();

    tokio::spawn(async move {
        let mut last_saved = match persistence.last_sequence().await {
            Ok(seq) => seq,
            Err(err) => {
                tracing::warn!(error = %err, "could not read last persisted sequence");
                0
            }
        };
        last_saved = backfill(&ledger_service, &persistence, last_saved).await;

        loop {
            match rx.recv().await {
                Ok(recorded) => {
                    if recorded.sequence <= last_saved {
                        continue;
                    }
                    if recorded.sequence > last_saved.saturating_add(1) {
                        last_saved = backfill(&ledger_service, &persistence, last_saved).await;
                    } else if save(&persistence, &recorded).await {
                        last_saved = recorded.sequence;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event recorder lagged; backfilling from journal");
                    last_saved = backfill(&ledger_service, &persistence, last_saved).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("event recorder stopped");
    })
}

/// Persists every journaled event after `from`. Returns the last sequence
/// written.
async fn backfill(
    ledger_service: &LedgerService,
    persistence: &PostgresPersistence,
    from: u64,
) -> u64 {
    let mut cursor = from;
    loop {
        let batch = ledger_service.events_after(cursor, BACKFILL_BATCH).await;
        if batch.is_empty() {
            return cursor;
        }
        for recorded in &batch {
            if !save(persistence, recorded).await {
                return cursor;
            }
            cursor = recorded.sequence;
        }
    }
}

async fn save(persistence: &PostgresPersistence, recorded: &RecordedEvent) -> bool {
    match persistence.save_event(recorded).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(
                sequence = recorded.sequence,
                error = %err,
                "failed to persist ledger event"
            );
            false
        }
    }
}
