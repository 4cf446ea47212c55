//! Application configuration loaded from environment variables.

use crate::errors::{IndexerError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// NEAR JSON-RPC endpoint (e.g. https://rpc.testnet.near.org)
    pub rpc_url: String,
    /// Account the factory contract is deployed on. Its sub-accounts are the
    /// proposals and projects it created.
    pub factory_account: String,
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) to poll the RPC for new blocks
    pub poll_interval_secs: u64,
    /// Maximum number of blocks scanned per poll
    pub blocks_per_poll: u64,
    /// Block to start from if no cursor is saved; `0` starts at the final tip
    pub start_block: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Config {
            rpc_url: var("RPC_URL", "https://rpc.testnet.near.org"),
            factory_account: lookup("FACTORY_ACCOUNT").ok_or_else(|| {
                IndexerError::Config("FACTORY_ACCOUNT environment variable is required".to_string())
            })?,
            database_url: var("DATABASE_URL", "sqlite:./crowdfund_events.db"),
            api_port: parse(&var("API_PORT", "3001"), "API_PORT")?,
            poll_interval_secs: parse(&var("POLL_INTERVAL_SECS", "5"), "POLL_INTERVAL_SECS")?,
            blocks_per_poll: parse(&var("BLOCKS_PER_POLL", "50"), "BLOCKS_PER_POLL")?,
            start_block: parse(&var("START_BLOCK", "0"), "START_BLOCK")?,
        };

        if config.blocks_per_poll == 0 {
            return Err(IndexerError::Config("BLOCKS_PER_POLL must be positive".to_string()));
        }
        if config.factory_account.trim().is_empty() {
            return Err(IndexerError::Config("FACTORY_ACCOUNT must not be empty".to_string()));
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| IndexerError::Config(format!("Invalid {key}: {raw:?}")))
}
