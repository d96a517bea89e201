//! Configuration types for the MPT wallet
//!
//! Manages global configuration including ledger network selection,
//! JSON-RPC endpoints, and the local wallets directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub ledger: LedgerConfig,
    /// Optional custom wallets directory
    pub wallets_dir: Option<String>,
}

/// Ledger network connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub network: NetworkType,
    /// JSON-RPC endpoint of the ledger node
    pub json_rpc_url: String,
    /// Base transaction fee in drops
    pub base_fee_drops: u64,
    /// Number of polling rounds while waiting for validation
    pub validation_attempts: u32,
    /// Initial delay between polling rounds, in milliseconds (backs off per round)
    pub validation_initial_delay_ms: u64,
}

/// Ledger network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Devnet,
    Testnet,
    Mainnet,
}

impl GlobalConfig {
    /// Create default configuration for devnet
    pub fn default_devnet() -> Self {
        Self {
            ledger: LedgerConfig {
                network: NetworkType::Devnet,
                json_rpc_url: default_json_rpc_url(NetworkType::Devnet),
                base_fee_drops: 10,
                validation_attempts: 10,
                validation_initial_delay_ms: 1_000,
            },
            wallets_dir: None,
        }
    }

    /// Create default configuration for testnet
    pub fn default_testnet() -> Self {
        Self {
            ledger: LedgerConfig {
                network: NetworkType::Testnet,
                json_rpc_url: default_json_rpc_url(NetworkType::Testnet),
                base_fee_drops: 10,
                validation_attempts: 10,
                validation_initial_delay_ms: 1_000,
            },
            wallets_dir: None,
        }
    }

    /// Create default configuration for mainnet
    pub fn default_mainnet() -> Self {
        Self {
            ledger: LedgerConfig {
                network: NetworkType::Mainnet,
                json_rpc_url: default_json_rpc_url(NetworkType::Mainnet),
                base_fee_drops: 10,
                validation_attempts: 10,
                validation_initial_delay_ms: 1_000,
            },
            wallets_dir: None,
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self::default_devnet()
    }
}

/// Get the default JSON-RPC URL for a given network
pub fn default_json_rpc_url(network: NetworkType) -> String {
    match network {
        NetworkType::Devnet => "https://s.devnet.rippletest.net:51234".to_string(),
        NetworkType::Testnet => "https://s.altnet.rippletest.net:51234".to_string(),
        NetworkType::Mainnet => "https://xrplcluster.com".to_string(),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Config directory not found")]
    DirectoryNotFound,
}

/// Configuration overrides from the caller or environment variables
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub network: Option<NetworkType>,
    pub json_rpc_url: Option<String>,
    pub wallets_dir: Option<String>,
}

impl ConfigOverrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Create overrides from environment variables
    ///
    /// Reads `LEDGER_NETWORK`, `LEDGER_URL`, and `WALLETS_DIR`.
    pub fn from_env() -> Self {
        Self {
            network: std::env::var("LEDGER_NETWORK").ok().and_then(|s| {
                match s.to_lowercase().as_str() {
                    "devnet" => Some(NetworkType::Devnet),
                    "testnet" => Some(NetworkType::Testnet),
                    "mainnet" => Some(NetworkType::Mainnet),
                    _ => None,
                }
            }),
            json_rpc_url: std::env::var("LEDGER_URL").ok(),
            wallets_dir: std::env::var("WALLETS_DIR").ok(),
        }
    }

    /// Merge with another set of overrides (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if other.network.is_some() {
            self.network = other.network;
        }
        if other.json_rpc_url.is_some() {
            self.json_rpc_url = other.json_rpc_url;
        }
        if other.wallets_dir.is_some() {
            self.wallets_dir = other.wallets_dir;
        }
        self
    }
}

/// Get the default configuration directory path
///
/// Returns: `~/.mpt-wallet/`
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".mpt-wallet"))
        .ok_or(ConfigError::DirectoryNotFound)
}

/// Get the default configuration file path
///
/// Returns: `~/.mpt-wallet/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_config_dir()?.join("config.json"))
}

/// Load configuration from file with overrides
///
/// # Priority (highest to lowest):
/// 1. Caller overrides (passed as argument)
/// 2. Environment variables
/// 3. Config file
/// 4. Network defaults
///
/// # Arguments
///
/// * `config_path` - Path to config file (optional, uses default if None)
/// * `caller_overrides` - Overrides from the embedding application
pub fn load_config(
    config_path: Option<&Path>,
    caller_overrides: ConfigOverrides,
) -> Result<GlobalConfig, ConfigError> {
    // Determine config path
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    // Start with network defaults or the file contents
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)?
    } else {
        match caller_overrides.network {
            Some(NetworkType::Mainnet) => GlobalConfig::default_mainnet(),
            Some(NetworkType::Testnet) => GlobalConfig::default_testnet(),
            _ => GlobalConfig::default_devnet(),
        }
    };

    // Apply environment variable overrides
    let env_overrides = ConfigOverrides::from_env();
    apply_overrides(&mut config, env_overrides);

    // Apply caller overrides (highest priority)
    apply_overrides(&mut config, caller_overrides);

    Ok(config)
}

/// Save configuration to file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &GlobalConfig, config_path: Option<&Path>) -> Result<(), ConfigError> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;

    Ok(())
}

/// Apply configuration overrides (internal helper)
fn apply_overrides(config: &mut GlobalConfig, overrides: ConfigOverrides) {
    // Apply network override (changes the default URL unless one is explicitly given)
    if let Some(network) = overrides.network {
        if config.ledger.network != network {
            config.ledger.network = network;
            if overrides.json_rpc_url.is_none() {
                config.ledger.json_rpc_url = default_json_rpc_url(network);
            }
        }
    }

    if let Some(url) = overrides.json_rpc_url {
        config.ledger.json_rpc_url = url;
    }

    if let Some(wallets_dir) = overrides.wallets_dir {
        config.wallets_dir = Some(wallets_dir);
    }
}
