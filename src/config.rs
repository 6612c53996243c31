use std::str::FromStr;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Blocks behind a recorded height that are re-scanned on the next pass.
pub const CONFIRMED_AFTER: u32 = 7;

/// Maximum number of addresses sent to the chain service in one query.
pub const BATCH_SIZE: usize = 50;

/// Maximum number of batch queries in flight during one sync pass.
pub const MAX_CONCURRENT_BATCHES: usize = 4;

/// Construction-time settings of an [`AddressTracker`](crate::AddressTracker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Network name understood by `bitcoin::Network` (`bitcoin`, `testnet`, `signet`, `regtest`).
    pub network: String,

    /// Confirmation depth: how far below its recorded height an address is re-scanned.
    pub confirmed_after: u32,

    pub batch_size: usize,

    pub max_concurrent_batches: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            network: "testnet".to_string(),
            confirmed_after: CONFIRMED_AFTER,
            batch_size: BATCH_SIZE,
            max_concurrent_batches: MAX_CONCURRENT_BATCHES,
        }
    }
}

impl TrackerConfig {
    pub fn for_network(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            ..Self::default()
        }
    }

    pub fn with_confirmed_after(mut self, confirmed_after: u32) -> Self {
        self.confirmed_after = confirmed_after;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_concurrent_batches(mut self, max: usize) -> Self {
        self.max_concurrent_batches = max;
        self
    }

    /// Checks every field once and resolves the network name.
    pub fn validate(&self) -> Result<Network> {
        let network = Network::from_str(&self.network).map_err(|_| {
            TrackerError::Configuration(format!("unsupported network name {:?}", self.network))
        })?;

        if self.batch_size == 0 {
            return Err(TrackerError::Configuration(
                "batch_size must be at least 1".to_string(),
            ));
        }

        if self.max_concurrent_batches == 0 {
            return Err(TrackerError::Configuration(
                "max_concurrent_batches must be at least 1".to_string(),
            ));
        }

        Ok(network)
    }
}
