//! Process configuration, read from the environment.

use std::net::SocketAddr;

use stockroom_infra::{ConfigError, StoreConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `BIND_ADDR` (default `0.0.0.0:8080`) plus the store variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: "BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            bind_addr,
            store: StoreConfig::from_lookup(lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ApiConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.store, StoreConfig::InMemory);
    }

    #[test]
    fn bind_addr_is_validated() {
        let err = ApiConfig::from_lookup(|key| {
            (key == "BIND_ADDR").then(|| "not-an-address".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BIND_ADDR", .. }));
    }

    #[test]
    fn bind_addr_override() {
        let config = ApiConfig::from_lookup(|key| {
            (key == "BIND_ADDR").then(|| "127.0.0.1:9000".to_string())
        })
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
    }
}
