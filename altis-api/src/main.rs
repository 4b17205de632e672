use std::net::SocketAddr;
use std::sync::Arc;

use altis_api::{app, AppState};
use altis_core::BookingLedger;
use altis_order::ReservationService;
use altis_store::{app_config::Config, DbClient, InMemoryLedger, LedgerBackend, PgBookingLedger};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "altis_api=debug,altis_order=debug,altis_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Altis seat reservations on port {}", config.server.port);

    let ledger: Arc<dyn BookingLedger> = match config.ledger.backend {
        LedgerBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgBookingLedger::new(db.pool))
        }
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory ledger; bookings will not survive a restart");
            Arc::new(InMemoryLedger::new())
        }
    };

    // Seat map is rebuilt from the ledger before any request is accepted.
    let reservations = Arc::new(
        ReservationService::open(config.cabin.clone(), ledger, &config.reservations)
            .await
            .context("Failed to restore reservations")?,
    );

    let app = app(AppState::new(reservations.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    reservations.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining requests");
}
