use crate::error::Result;
use crate::tracker::domain::RawTxInfo;

/// Minimal chain-data interface used by the tracker.
/// Everything is address-based.
///
/// Implementations apply their own timeouts; any failure is reported as
/// [`TrackerError::ChainService`](crate::TrackerError::ChainService).
#[allow(async_fn_in_trait)]
pub trait ChainApi: Send + Sync {
    /// Height of the current chain tip.
    async fn latest_height(&self) -> Result<u32>;

    /// Every confirmed transaction at or above `min_height` that spends from or pays
    /// to any of `addresses`.
    async fn transactions_for(&self, addresses: &[String], min_height: u32) -> Result<Vec<RawTxInfo>>;
}
