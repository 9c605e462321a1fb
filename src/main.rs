//! stake-escrow server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use stake_escrow::app_state::AppState;
use stake_escrow::config::EscrowConfig;
use stake_escrow::domain::{EventBus, InMemoryTreasury, Ledger};
use stake_escrow::persistence::{PostgresPersistence, spawn_event_recorder};
use stake_escrow::service::LedgerService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = EscrowConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        owner = %config.owner,
        stake = %config.stake_amount,
        policy = %config.stake_policy,
        "starting stake-escrow"
    );

    // Optional event log, replayed into the ledger before serving
    let persistence = if config.persistence_enabled {
        let persistence =
            PostgresPersistence::connect(&config.database_url, config.database_max_connections)
                .await
                .context("connecting to PostgreSQL")?;
        Some(persistence)
    } else {
        None
    };

    // Build domain layer
    let ledger = match &persistence {
        Some(persistence) => {
            let journal = persistence
                .load_journal()
                .await
                .context("loading ledger history")?;
            let replayed = journal.len();
            let ledger = Ledger::from_journal(
                config.owner,
                config.stake_amount,
                config.stake_policy,
                journal,
            )
            .context("replaying ledger history")?;
            tracing::info!(
                events = replayed,
                last_sequence = ledger.last_sequence(),
                "ledger restored from event log"
            );
            ledger
        }
        None => Ledger::new(config.owner, config.stake_amount, config.stake_policy)
            .context("building ledger")?,
    }
    .with_journal_capacity(config.journal_capacity);
    let treasury = Arc::new(InMemoryTreasury::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let ledger_service = Arc::new(LedgerService::new(ledger, treasury, event_bus));

    if let Some(persistence) = persistence {
        let _recorder = spawn_event_recorder(Arc::clone(&ledger_service), persistence);
        tracing::info!("event log persistence enabled");
    }

    // Build router
    let app_state = AppState::new(ledger_service, config.owner_api_key.clone());
    let app = stake_escrow::build_app(
        app_state,
        Duration::from_secs(config.request_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
