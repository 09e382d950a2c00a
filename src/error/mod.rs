//! Error handling for the ledger
//!
//! Validation failures (bad signature, insufficient balance, malformed request)
//! are reported as plain booleans by the ledger. Everything here is for the
//! failures that have to travel: storage, peer I/O, codecs and configuration.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Durable head store errors
    Database(String),
    /// Key, signature or hash decoding errors
    Crypto(String),
    /// Peer communication errors
    Network(String),
    /// Malformed transaction requests
    Transaction(String),
    /// Configuration errors
    Config(String),
    /// JSON/TOML encoding errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// Block or chain shape errors
    InvalidBlock(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Database(msg) => write!(f, "Database error: {msg}"),
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<sled::Error> for BlockchainError {
    fn from(err: sled::Error) -> Self {
        BlockchainError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

impl From<ureq::Error> for BlockchainError {
    fn from(err: ureq::Error) -> Self {
        BlockchainError::Network(err.to_string())
    }
}
