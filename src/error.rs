//! Error types for proofchain

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// Peer registration input that is neither a network location nor a path.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A peer could not be reached or answered with something unusable.
    /// Consensus resolution skips the peer instead of failing.
    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    /// `index` is the 1-based index of the first offending block.
    #[error("Invalid chain at block {index}: {reason}")]
    InvalidChain { index: u64, reason: String },

    #[error("Chain is empty; a chain must contain at least the genesis block")]
    EmptyChain,

    #[error("Proof-of-work search was cancelled")]
    MiningCancelled,

    #[error("Proof-of-work search exceeded its deadline of {0:?}")]
    MiningTimeout(std::time::Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
