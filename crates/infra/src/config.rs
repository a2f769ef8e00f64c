//! Store configuration loading and representation.

use std::sync::Arc;

use thiserror::Error;

use crate::store::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore, StoreResult};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which catalog backend to run against.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process-local store (dev/test); contents are lost on restart.
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

// Keep credentials in the connection string out of logs.
impl core::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreConfig::InMemory => f.write_str("InMemory"),
            StoreConfig::Postgres {
                max_connections, ..
            } => f
                .debug_struct("Postgres")
                .field("database_url", &"<redacted>")
                .field("max_connections", max_connections)
                .finish(),
        }
    }
}

impl StoreConfig {
    /// Read the store configuration through an arbitrary variable lookup.
    ///
    /// - `USE_PERSISTENT_STORES`: `true`/`false` (default `false`)
    /// - `DATABASE_URL`: required when persistent
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default 5)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let use_persistent = match lookup("USE_PERSISTENT_STORES") {
            None => false,
            Some(value) => parse_bool(&value).ok_or_else(|| ConfigError::Invalid {
                var: "USE_PERSISTENT_STORES",
                value: value.clone(),
                reason: "expected true or false".to_string(),
            })?,
        };

        if !use_persistent {
            return Ok(StoreConfig::InMemory);
        }

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "DATABASE_MAX_CONNECTIONS",
                    value: value.clone(),
                    reason: "expected a positive integer".to_string(),
                })?,
        };

        Ok(StoreConfig::Postgres {
            database_url,
            max_connections,
        })
    }

    /// Open the configured backend (running schema setup for Postgres).
    pub async fn open(&self) -> StoreResult<Arc<dyn CatalogStore>> {
        match self {
            StoreConfig::InMemory => {
                tracing::warn!("using in-memory catalog store; data is not persisted");
                Ok(Arc::new(InMemoryCatalogStore::new()))
            }
            StoreConfig::Postgres {
                database_url,
                max_connections,
            } => {
                let store = PostgresCatalogStore::connect(database_url, *max_connections).await?;
                store.migrate().await?;
                tracing::info!(max_connections, "connected to postgres catalog store");
                Ok(Arc::new(store))
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}
