//! Anteroom server entry point.
//!
//! Loads configuration (failing fast on missing secrets), initializes
//! structured logging, wires up the connection pool and spreadsheet client,
//! then starts the Axum HTTP server with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};

use anteroom_server::config::Config;
use anteroom_server::routes;
use anteroom_server::sheets::SheetsClient;
use anteroom_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets have no embedded defaults — a missing one fails startup here.
    let config = Config::from_env().context("invalid configuration")?;

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!("anteroom starting");

    // Lazy pool: the database is only touched by the verification pipeline,
    // which maps acquire failures to its own redirect destination.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&config.database_url)
        .context("invalid DATABASE_URL")?;

    let sheets = match &config.sheets {
        Some(sheets_config) => Some(
            SheetsClient::new(sheets_config)
                .context("invalid spreadsheet service account key")?,
        ),
        None => {
            warn!("spreadsheet credentials not configured — waitlist submissions will fail");
            None
        }
    };

    let state = Arc::new(AppState {
        config,
        pool,
        sheets,
    });

    let app = routes::router(Arc::clone(&state));

    let listener = TcpListener::bind(state.config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", state.config.bind_addr))?;

    info!(addr = %state.config.bind_addr, "anteroom listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("anteroom stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
