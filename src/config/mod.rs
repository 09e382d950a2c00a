//! Configuration management
//!
//! Node settings come from `CHAIN_*` environment variables or a TOML file.
//! The resulting `ChainConfig` is handed to the ledger at construction and
//! never changes afterwards.

pub mod settings;

pub use settings::ChainConfig;
