use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::api::tokens::ACCESS_TOKEN_COOKIE;
use crate::db::DbConfig;

/// Which event store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local; contents are lost on restart.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unknown store backend '{other}' (expected postgres or memory)")),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub dev_mode: bool,
    pub store: StoreBackend,
    pub jwt_secret: String,
    pub token_cookie: String,
    pub database: DbConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("log_level", &self.log_level)
            .field("dev_mode", &self.dev_mode)
            .field("store", &self.store)
            .field("jwt_secret", &"<redacted>")
            .field("token_cookie", &self.token_cookie)
            .field("database", &self.database)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let listen_addr = lookup("EVENTLY_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8000".to_string())
            .parse::<SocketAddr>()
            .context("EVENTLY_LISTEN_ADDR is not a socket address")?;

        let log_level = lookup("EVENTLY_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let dev_mode = lookup("EVENTLY_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let store = match lookup("EVENTLY_STORE") {
            Some(value) => value.parse::<StoreBackend>()?,
            None => StoreBackend::Postgres,
        };

        let Some(jwt_secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) else {
            bail!("JWT_SECRET must be set");
        };

        let token_cookie =
            lookup("EVENTLY_TOKEN_COOKIE").unwrap_or_else(|| ACCESS_TOKEN_COOKIE.to_string());

        let database = database_config(&lookup)?;

        Ok(Self {
            listen_addr,
            log_level,
            dev_mode,
            store,
            jwt_secret,
            token_cookie,
            database,
        })
    }
}

fn database_config(lookup: &impl Fn(&str) -> Option<String>) -> Result<DbConfig> {
    let defaults = DbConfig::default();

    let parse_u32 = |key: &str, default: u32| -> Result<u32> {
        match lookup(key) {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("{key} must be a non-negative integer")),
            None => Ok(default),
        }
    };

    let max_connections = parse_u32("DB_MAX_CONNECTIONS", defaults.max_connections)?;
    let min_connections = parse_u32("DB_MIN_CONNECTIONS", defaults.min_connections)?;
    if max_connections == 0 {
        bail!("DB_MAX_CONNECTIONS must be at least 1");
    }
    if min_connections > max_connections {
        bail!("DB_MIN_CONNECTIONS ({min_connections}) exceeds DB_MAX_CONNECTIONS ({max_connections})");
    }

    let acquire_timeout = match lookup("DB_ACQUIRE_TIMEOUT_SECS") {
        Some(value) => Duration::from_secs(
            value
                .trim()
                .parse::<u64>()
                .context("DB_ACQUIRE_TIMEOUT_SECS must be a whole number of seconds")?,
        ),
        None => defaults.acquire_timeout,
    };

    Ok(DbConfig {
        database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
        max_connections,
        min_connections,
        acquire_timeout,
        migrations_dir: lookup("EVENTLY_MIGRATIONS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.migrations_dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(
            config.listen_addr,
            "127.0.0.1:8000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.log_level, "info");
        assert!(!config.dev_mode);
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.token_cookie, "access_token");
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "")])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("EVENTLY_LISTEN_ADDR", "0.0.0.0:9000"),
            ("EVENTLY_DEV", "TRUE"),
            ("EVENTLY_STORE", "memory"),
            ("EVENTLY_TOKEN_COOKIE", "session"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert!(config.dev_mode);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.token_cookie, "session");
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("EVENTLY_STORE", "mongo"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("EVENTLY_LISTEN_ADDR", "nowhere"),
        ]))
        .is_err());
    }

    #[test]
    fn test_database_settings() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://u:pw@db:5433/evently"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("DB_MIN_CONNECTIONS", "2"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "3"),
            ("EVENTLY_MIGRATIONS_DIR", "/srv/migrations"),
        ]))
        .unwrap();
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 2);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.database.migrations_dir, PathBuf::from("/srv/migrations"));
        assert_eq!(config.database.target(), "db:5433/evently");
    }

    #[rstest::rstest]
    #[case("DB_MAX_CONNECTIONS", "lots")]
    #[case("DB_MAX_CONNECTIONS", "0")]
    #[case("DB_MIN_CONNECTIONS", "50")]
    #[case("DB_ACQUIRE_TIMEOUT_SECS", "-1")]
    fn test_bad_database_settings_rejected(#[case] key: &str, #[case] value: &str) {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret"), (key, value)])).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://u:dbpass@db/evently"),
        ]))
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("dbpass"));
    }
}
