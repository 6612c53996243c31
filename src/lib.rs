//! Incremental address and transaction tracker backed by an Electrum server.
//!
//! Watched addresses are synced in batches against a [`ChainApi`], the fetched
//! transactions are parsed and merged into per-address records, and everything is kept
//! in a [`KvStore`].

pub mod config;
pub mod error;
pub mod persistence;
pub mod polling;
pub mod tracker;

#[cfg(test)]
mod test_utils;

pub use config::TrackerConfig;
pub use error::{ParseError, Result, TrackerError};
pub use persistence::{KvStore, MemoryStore, SledStore, TrackerStore};
pub use polling::{follow, FollowStats};
pub use tracker::chain::{ChainApi, ElectrumChainClient, MockChainClient};
pub use tracker::domain::{
    parse_tx, AddressRecord, AddressWithTransactions, RawTxInfo, TransactionRecord,
};
pub use tracker::runtime::{AddressTracker, SyncReport, TrackerPhase};
