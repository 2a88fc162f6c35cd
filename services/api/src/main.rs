//! evently API server
//!
//! Serves the event REST API over an explicitly connected store and tears
//! the store down again on shutdown.

use std::sync::Arc;

use anyhow::Result;
use evently_api::{
    api::{self, tokens::CredentialVerifier},
    config::{self, StoreBackend},
    db::Database,
    state::AppState,
    store::{EventStore, MemoryEventStore},
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to EVENTLY_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting evently API");
    info!(listen_addr = %config.listen_addr, store = ?config.store, "Configuration loaded");

    let (store, database): (Arc<dyn EventStore>, Option<Database>) = match config.store {
        StoreBackend::Postgres => {
            let db = match Database::connect(&config.database).await {
                Ok(db) => {
                    info!("Database connection established");
                    db
                }
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return Err(e.into());
                }
            };

            // Run migrations in dev mode
            if config.dev_mode {
                info!("Running database migrations (dev mode)");
                if let Err(e) = db.run_migrations(&config.database.migrations_dir).await {
                    error!(error = %e, "Failed to run migrations");
                    return Err(e.into());
                }
            }

            let store: Arc<dyn EventStore> = Arc::new(db.event_store());
            (store, Some(db))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory event store; events are lost on shutdown");
            let store: Arc<dyn EventStore> = Arc::new(MemoryEventStore::new());
            (store, None)
        }
    };

    let verifier = CredentialVerifier::new(config.jwt_secret.as_bytes(), &config.token_cookie);
    let state = AppState::new(store, verifier);

    // Build and run the server
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn the server with graceful shutdown
    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    // Wait for shutdown signal (Ctrl+C)
    let server_exited = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            false
        }
        result = &mut server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
            true
        }
    };

    if !server_exited {
        let _ = shutdown_tx.send(true);
        let drain_timeout = std::time::Duration::from_secs(10);
        if tokio::time::timeout(drain_timeout, server_handle).await.is_err() {
            warn!("HTTP server did not drain in time");
        }
    }

    if let Some(db) = database {
        db.close().await;
    }

    info!("evently API shutdown complete");
    Ok(())
}
