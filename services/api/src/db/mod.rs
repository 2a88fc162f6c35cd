//! Postgres persistence for events.
//!
//! [`Database`] owns the pool for the lifetime of the process. `main`
//! connects it, applies migrations in dev mode, hands [`PgEventStore`]
//! handles to the service and closes it on shutdown.

mod error;
mod event_store;

pub use error::DbError;
pub use event_store::PgEventStore;

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/evently";

/// Pool and migration settings.
#[derive(Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// Directory holding the `NNNN_name.sql` migration files.
    pub migrations_dir: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            migrations_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations")),
        }
    }
}

impl DbConfig {
    /// `host:port/database` for logs. Never includes credentials.
    pub fn target(&self) -> String {
        match self.database_url.parse::<PgConnectOptions>() {
            Ok(options) => format!(
                "{}:{}/{}",
                options.get_host(),
                options.get_port(),
                options.get_database().unwrap_or("")
            ),
            Err(_) => "<unparseable>".to_string(),
        }
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("target", &self.target())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("migrations_dir", &self.migrations_dir)
            .finish()
    }
}

/// Connection pool handle.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let options = config
            .database_url
            .parse::<PgConnectOptions>()
            .map_err(DbError::Connect)?;

        info!(
            target_db = %config.target(),
            max_connections = config.max_connections,
            "Connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(DbError::Connect)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies pending migrations from `dir`.
    pub async fn run_migrations(&self, dir: &Path) -> Result<(), DbError> {
        let migrator = Migrator::new(dir.to_path_buf())
            .await
            .map_err(|source| DbError::MigrationSource {
                dir: dir.display().to_string(),
                source,
            })?;

        info!(
            migrations_dir = %dir.display(),
            known = migrator.iter().count(),
            "Applying migrations"
        );
        migrator.run(&self.pool).await.map_err(DbError::Migration)?;
        Ok(())
    }

    pub fn event_store(&self) -> PgEventStore {
        PgEventStore::new(self.pool.clone())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}
