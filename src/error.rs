//! Error taxonomy for the tracker.
//!
//! Every fallible operation in the library returns [`TrackerError`]. The binary wraps
//! these in `anyhow` at the edge.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Bad construction-time arguments. Fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Height or transaction query against the chain service failed.
    #[error("chain service error: {0}")]
    ChainService(String),

    /// Read or write against the persistent store failed.
    #[error("store error: {0}")]
    Store(String),

    /// A stored value could not be encoded or decoded as JSON.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Never-watched address or unknown transaction id.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Some batches of a sync pass failed. The ones that succeeded are persisted.
    #[error("{failed} of {total} batches failed: {source}")]
    PartialSync {
        failed: usize,
        total: usize,
        #[source]
        source: Box<TrackerError>,
    },
}

impl TrackerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::NotFound(_))
    }
}

/// Failure to turn a raw transaction into a [`TransactionRecord`](crate::tracker::domain::TransactionRecord).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown network name {0:?}")]
    UnknownNetwork(String),

    #[error("transaction hex is not valid hex: {0}")]
    Hex(String),

    #[error("transaction bytes do not decode: {0}")]
    Decode(String),
}
