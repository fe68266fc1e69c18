use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{Address, Epoch, Lovelace, ProtocolParams};

/// Initial state the ledger starts from
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenesisConfig {
    #[serde(default)]
    pub epoch: Epoch,

    /// Undistributed supply that rewards are paid from
    #[serde(default)]
    pub reserves: Lovelace,

    /// Initial address balances
    #[serde(default)]
    pub funds: BTreeMap<Address, Lovelace>,

    #[serde(default)]
    pub pparams: ProtocolParams,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            epoch: 0,
            reserves: 45_000_000_000_000_000,
            funds: Default::default(),
            pparams: Default::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServeConfig {
    /// Path of the Unix socket the daemon listens on
    pub listen_path: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            listen_path: PathBuf::from("stakeledger.socket"),
        }
    }
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct LoggingConfig {
    #[serde_as(as = "DisplayFromStr")]
    pub max_level: tracing::Level,

    #[serde(default)]
    pub include_tokio: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            max_level: tracing::Level::INFO,
            include_tokio: Default::default(),
        }
    }
}

/// Backoff policy for client-side polling
#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub backoff_unit_millis: u64,
    pub backoff_factor: u32,
    pub max_backoff_millis: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 20,
            backoff_unit_millis: 100,
            backoff_factor: 2,
            max_backoff_millis: 5_000,
        }
    }
}

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct RootConfig {
    #[serde(default)]
    pub genesis: GenesisConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub retries: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
