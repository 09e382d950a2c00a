use crate::core::Amount;
use crate::error::{BlockchainError, Result};
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DIFFICULTY_KEY: &str = "CHAIN_MINING_DIFFICULTY";
const MINING_SENDER_KEY: &str = "CHAIN_MINING_SENDER";
const REWARD_TOKEN_KEY: &str = "CHAIN_DEFAULT_REWARD_TOKEN";
const MINING_REWARD_KEY: &str = "CHAIN_MINING_REWARD";
const MINING_TIMER_KEY: &str = "CHAIN_MINING_TIMER_SECONDS";
const NODE_SYNC_KEY: &str = "CHAIN_BLOCKCHAIN_NODE_SYNC_TIME_SEC";
const PORT_RANGE_START_KEY: &str = "CHAIN_BLOCKCHAIN_PORT_RANGE_START";
const PORT_RANGE_END_KEY: &str = "CHAIN_BLOCKCHAIN_PORT_RANGE_END";
const IP_RANGE_START_KEY: &str = "CHAIN_NODE_IP_RANGE_START";
const IP_RANGE_END_KEY: &str = "CHAIN_NODE_IP_RANGE_END";
const PORT_KEY: &str = "CHAIN_PORT";
const DB_PATH_KEY: &str = "CHAIN_DB_SAVE_PATH";
const NODE_HOST_KEY: &str = "CHAIN_NODE_HOST";
const REQUEST_TIMEOUT_KEY: &str = "CHAIN_REQUEST_TIMEOUT_MS";
const CONNECT_TIMEOUT_KEY: &str = "CHAIN_CONNECT_TIMEOUT_MS";

const MAX_DIFFICULTY: usize = 64;

/// Everything a node needs that stays fixed for the life of the process.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Leading zero hex characters required in a block's proof hash
    pub difficulty: usize,
    /// The privileged sender identity used for mining rewards
    pub mining_sender: String,
    pub reward_token: String,
    pub mining_reward: Amount,
    pub mining_interval_secs: u64,
    pub node_sync_interval_secs: u64,
    pub port: u16,
    pub discovery_host: Ipv4Addr,
    pub ip_range_start: u8,
    pub ip_range_end: u8,
    pub port_range_start: u16,
    pub port_range_end: u16,
    /// Defaults to `data/node_<port>` when unset
    pub db_path: Option<PathBuf>,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            difficulty: 3,
            mining_sender: "DENIZ".to_string(),
            reward_token: "DNZ".to_string(),
            mining_reward: Amount::from_integer(1),
            mining_interval_secs: 20,
            node_sync_interval_secs: 20,
            port: 5000,
            discovery_host: Ipv4Addr::LOCALHOST,
            ip_range_start: 0,
            ip_range_end: 0,
            port_range_start: 5000,
            port_range_end: 5003,
            db_path: None,
            request_timeout_ms: 3000,
            connect_timeout_ms: 500,
        }
    }
}

impl ChainConfig {
    /// Reads `CHAIN_*` environment variables over the defaults.
    pub fn from_env() -> Result<ChainConfig> {
        let defaults = ChainConfig::default();
        let config = ChainConfig {
            difficulty: env_or(DIFFICULTY_KEY, defaults.difficulty)?,
            mining_sender: env_or(MINING_SENDER_KEY, defaults.mining_sender)?,
            reward_token: env_or(REWARD_TOKEN_KEY, defaults.reward_token)?,
            mining_reward: env_or(MINING_REWARD_KEY, defaults.mining_reward)?,
            mining_interval_secs: env_or(MINING_TIMER_KEY, defaults.mining_interval_secs)?,
            node_sync_interval_secs: env_or(NODE_SYNC_KEY, defaults.node_sync_interval_secs)?,
            port: env_or(PORT_KEY, defaults.port)?,
            discovery_host: env_or(NODE_HOST_KEY, defaults.discovery_host)?,
            ip_range_start: env_or(IP_RANGE_START_KEY, defaults.ip_range_start)?,
            ip_range_end: env_or(IP_RANGE_END_KEY, defaults.ip_range_end)?,
            port_range_start: env_or(PORT_RANGE_START_KEY, defaults.port_range_start)?,
            port_range_end: env_or(PORT_RANGE_END_KEY, defaults.port_range_end)?,
            db_path: env::var(DB_PATH_KEY).ok().map(PathBuf::from),
            request_timeout_ms: env_or(REQUEST_TIMEOUT_KEY, defaults.request_timeout_ms)?,
            connect_timeout_ms: env_or(CONNECT_TIMEOUT_KEY, defaults.connect_timeout_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<ChainConfig> {
        let contents = std::fs::read_to_string(path)?;
        ChainConfig::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<ChainConfig> {
        let config: ChainConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty must be between 1 and {MAX_DIFFICULTY}, got {}",
                self.difficulty
            )));
        }
        if self.reward_token.is_empty() {
            return Err(BlockchainError::Config(
                "reward token name must not be empty".to_string(),
            ));
        }
        if self.mining_sender.is_empty() {
            return Err(BlockchainError::Config(
                "mining sender identity must not be empty".to_string(),
            ));
        }
        if self.ip_range_start > self.ip_range_end {
            return Err(BlockchainError::Config(format!(
                "empty IP range {}..={}",
                self.ip_range_start, self.ip_range_end
            )));
        }
        if self.port_range_start > self.port_range_end {
            return Err(BlockchainError::Config(format!(
                "empty port range {}..={}",
                self.port_range_start, self.port_range_end
            )));
        }
        Ok(())
    }

    pub fn get_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => path.clone(),
            None => PathBuf::from("data").join(format!("node_{}", self.port)),
        }
    }

    pub fn mining_interval(&self) -> Duration {
        Duration::from_secs(self.mining_interval_secs)
    }

    pub fn node_sync_interval(&self) -> Duration {
        Duration::from_secs(self.node_sync_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| BlockchainError::Config(format!("{key}='{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ChainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.get_db_path(), PathBuf::from("data/node_5000"));
        assert_eq!(config.mining_interval(), Duration::from_secs(20));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = ChainConfig::from_toml_str(
            r#"
            difficulty = 2
            mining_reward = "10"
            port = 5001
            db_path = "/tmp/node"
            "#,
        )
        .unwrap();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.mining_reward, Amount::from_integer(10));
        assert_eq!(config.port, 5001);
        assert_eq!(config.reward_token, "DNZ");
        assert_eq!(config.get_db_path(), PathBuf::from("/tmp/node"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(ChainConfig::from_toml_str("difficulty = 0").is_err());
        assert!(ChainConfig::from_toml_str("difficulty = 65").is_err());
        assert!(ChainConfig::from_toml_str("port_range_start = 10\nport_range_end = 5").is_err());
        assert!(ChainConfig::from_toml_str("reward_token = \"\"").is_err());
    }

    #[test]
    fn test_env_or_reports_bad_values() {
        std::env::set_var("CHAIN_TEST_ONLY_PORT", "not-a-port");
        let result: Result<u16> = env_or("CHAIN_TEST_ONLY_PORT", 1);
        assert!(matches!(result, Err(BlockchainError::Config(_))));
        std::env::remove_var("CHAIN_TEST_ONLY_PORT");

        let fallback: Result<u16> = env_or("CHAIN_TEST_ONLY_UNSET", 7);
        assert_eq!(fallback.unwrap(), 7);
    }
}
