//! PostgreSQL implementation of the event log.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::StoredEvent;
use crate::domain::RecordedEvent;
use crate::error::EscrowError;

/// Rows fetched per query when loading the journal.
const LOAD_BATCH: usize = 1_000;

/// PostgreSQL-backed event log using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`EscrowError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, EscrowError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| EscrowError::PersistenceError(e.to_string()))?;

        Ok(Self::new(pool))
    }

    /// Appends a recorded event to the log.
    ///
    /// # Errors
    ///
    /// Returns a [`EscrowError::PersistenceError`] on database failure,
    /// including when the sequence is already stored.
    pub async fn save_event(&self, recorded: &RecordedEvent) -> Result<(), EscrowError> {
        let sequence = i64::try_from(recorded.sequence)
            .map_err(|_| EscrowError::PersistenceError("sequence out of range".to_string()))?;
        let payload = serde_json::to_value(recorded)
            .map_err(|e| EscrowError::PersistenceError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO ledger_events (sequence, event_type, payload) VALUES ($1, $2, $3)",
        )
        .bind(sequence)
        .bind(recorded.event.event_type_str())
        .bind(&payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads up to `limit` events with a sequence strictly greater than
    /// `after`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`EscrowError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: u64,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, EscrowError> {
        let after = i64::try_from(after).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, StoredEvent>(
            "SELECT sequence, event_type, payload, created_at FROM ledger_events \
             WHERE sequence > $1 ORDER BY sequence ASC LIMIT $2",
        )
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Loads the whole stored history, oldest first, for replay into a
    /// fresh ledger.
    ///
    /// # Errors
    ///
    /// Returns a [`EscrowError::PersistenceError`] on database failure and
    /// [`EscrowError::CorruptJournal`] if a row does not decode.
    pub async fn load_journal(&self) -> Result<Vec<RecordedEvent>, EscrowError> {
        let mut journal = Vec::new();
        let mut after = 0u64;
        loop {
            let rows = self.load_events_after(after, LOAD_BATCH).await?;
            let Some(last) = rows.last() else {
                return Ok(journal);
            };
            after = u64::try_from(last.sequence).unwrap_or(u64::MAX);
            for row in rows {
                journal.push(row.into_recorded()?);
            }
        }
    }

    /// Returns the highest stored sequence, or zero for an empty log.
    ///
    /// # Errors
    ///
    /// Returns a [`EscrowError::PersistenceError`] on database failure.
    pub async fn last_sequence(&self) -> Result<u64, EscrowError> {
        let max = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(sequence) FROM ledger_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.and_then(|s| u64::try_from(s).ok()).unwrap_or(0))
    }
}
