//! Configuration management for proofchain nodes

use crate::error::{ChainError, Result};
use crate::miner::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub miner: MinerConfig,
    pub consensus: ConsensusConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
            bootstrap_peers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    /// Reward recipient. A random identity is generated when unset.
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            identity: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default = "default_peer_timeout_secs")]
    pub peer_timeout_secs: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            peer_timeout_secs: default_peer_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}

fn default_peer_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.miner.difficulty == 0 || self.miner.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::Config(format!(
                "miner.difficulty must be between 1 and {}, got {}",
                MAX_DIFFICULTY, self.miner.difficulty
            )));
        }

        if self.network.api_port == 0 {
            return Err(ChainError::Config("network.api_port must be non-zero".to_string()));
        }

        if self.network.host.trim().is_empty() {
            return Err(ChainError::Config("network.host must be set".to_string()));
        }

        if let Some(identity) = &self.miner.identity {
            if identity.trim().is_empty() {
                return Err(ChainError::Config("miner.identity must not be blank".to_string()));
            }
        }

        if self.miner.timeout_secs == Some(0) {
            return Err(ChainError::Config("miner.timeout_secs must be non-zero".to_string()));
        }

        Ok(())
    }

    pub fn mining_timeout(&self) -> Option<Duration> {
        self.miner.timeout_secs.map(Duration::from_secs)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.consensus.peer_timeout_secs)
    }
}

/// Load `config.toml` from the working directory.
pub fn load_config() -> Result<Config> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    match fs::read_to_string(path.as_ref()) {
        Ok(source) => Config::from_toml_str(&source),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}
