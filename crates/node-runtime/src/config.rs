//! # Node Configuration
//!
//! Defaults, optionally replaced by a JSON file, then overridden by
//! environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LC_CONFIG` | path of a JSON file holding a whole [`NodeConfig`] |
//! | `LC_CURRENCY` | `ledger.currency` |
//! | `LC_POOL_CAPACITY` | `pool.capacity` |
//! | `LC_NODE_SEED` | `node.key_seed` (64 hex chars) |
//! | `LC_BUS_CAPACITY` | `bus_capacity` |
//! | `LC_LOG` | `log_filter` |

use lc_04_documents::DEFAULT_SANDBOX_CAPACITY;
use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_crypto::Ed25519KeyPair;
use shared_types::ConsensusParams;
use std::path::PathBuf;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub ledger: LedgerConfig,
    pub pool: PoolConfig,
    pub node: NodeKeyConfig,
    /// Events buffered per subscriber.
    pub bus_capacity: usize,
    /// `tracing_subscriber::EnvFilter` directives.
    pub log_filter: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            pool: PoolConfig::default(),
            node: NodeKeyConfig::default(),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            log_filter: "info".into(),
        }
    }
}

/// Currency settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub currency: String,
    /// Used until a root block brings the chain's own parameters.
    pub params: ConsensusParams,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: "g1-test".into(),
            params: ConsensusParams::default(),
        }
    }
}

/// Pending transaction pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_SANDBOX_CAPACITY,
        }
    }
}

/// Identity of the running node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeKeyConfig {
    /// Hex seed of the node key; a fresh key is generated when absent.
    pub key_seed: Option<String>,
}

impl NodeKeyConfig {
    pub fn keypair(&self) -> Result<Ed25519KeyPair, ConfigError> {
        match &self.key_seed {
            Some(seed) => {
                Ed25519KeyPair::from_hex_seed(seed).map_err(|_| ConfigError::InvalidKeySeed)
            }
            None => Ok(Ed25519KeyPair::generate()),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Node key seed must be 32 bytes (64 hex chars)")]
    InvalidKeySeed,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to read variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("LC_CONFIG") {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };

        if let Some(currency) = lookup("LC_CURRENCY") {
            config.ledger.currency = currency;
        }
        if let Some(value) = lookup("LC_POOL_CAPACITY") {
            config.pool.capacity = parse_number("LC_POOL_CAPACITY", value)?;
        }
        if let Some(seed) = lookup("LC_NODE_SEED") {
            config.node.key_seed = Some(seed);
        }
        if let Some(value) = lookup("LC_BUS_CAPACITY") {
            config.bus_capacity = parse_number("LC_BUS_CAPACITY", value)?;
        }
        if let Some(filter) = lookup("LC_LOG") {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.capacity == 0 {
            return Err(ConfigError::Zero("pool.capacity"));
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::Zero("bus_capacity"));
        }
        self.node.keypair().map(|_| ())
    }
}

fn parse_number(var: &'static str, value: String) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
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
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.pool.capacity, DEFAULT_SANDBOX_CAPACITY);
    }

    #[test]
    fn test_env_overrides() {
        let seed = "07".repeat(32);
        let config = NodeConfig::from_lookup(lookup(&[
            ("LC_CURRENCY", "beta"),
            ("LC_POOL_CAPACITY", "5"),
            ("LC_NODE_SEED", &seed),
            ("LC_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.ledger.currency, "beta");
        assert_eq!(config.pool.capacity, 5);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(
            config.node.keypair().unwrap().public_key(),
            Ed25519KeyPair::from_seed([7; 32]).public_key()
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = NodeConfig::from_lookup(lookup(&[("LC_POOL_CAPACITY", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "LC_POOL_CAPACITY", .. }));

        let err = NodeConfig::from_lookup(lookup(&[("LC_POOL_CAPACITY", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Zero("pool.capacity")));

        let err = NodeConfig::from_lookup(lookup(&[("LC_NODE_SEED", "abcd")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKeySeed));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: NodeConfig = serde_json::from_str(r#"{"pool": {"capacity": 3}}"#).unwrap();
        assert_eq!(config.pool.capacity, 3);
        assert_eq!(config.ledger, LedgerConfig::default());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = NodeConfig::from_lookup(lookup(&[("LC_CONFIG", "/nonexistent/lc.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
