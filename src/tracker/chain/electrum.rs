//! Electrum-backed chain service.
//!
//! Wraps the blocking `electrum_client::Client` shipped with `bdk_electrum`. Every
//! request runs on tokio's blocking pool so the sync pass can keep several batches
//! in flight.

use std::collections::HashSet;
use std::sync::Arc;

use bdk_electrum::electrum_client::{Client, ElectrumApi as _};
use bitcoin::{Network, ScriptBuf, Txid};

use crate::error::{Result, TrackerError};
use crate::tracker::chain::ChainApi;
use crate::tracker::domain::{checked_address, RawTxInfo};

pub struct ElectrumChainClient {
    inner: Arc<Client>,
    network: Network,
}

impl ElectrumChainClient {
    /// Connects to `url` (`ssl://host:port` or `tcp://host:port`).
    pub fn new(url: &str, network: Network) -> Result<Self> {
        log::info!("[ELECTRUM] Connecting to {} ...", url);
        let client = Client::new(url).map_err(|e| {
            TrackerError::ChainService(format!("connecting to {}: {}", url, e))
        })?;

        Ok(Self {
            inner: Arc::new(client),
            network,
        })
    }
}

/// Script pubkey Electrum indexes the address under.
pub fn script_for_address(address: &str, network: Network) -> Result<ScriptBuf> {
    Ok(checked_address(address, network)?.script_pubkey())
}

/// Confirmed history of `scripts` from `min_height` up, one entry per transaction.
fn fetch_history(client: &Client, scripts: &[ScriptBuf], min_height: u32) -> Result<Vec<RawTxInfo>> {
    let histories = client
        .batch_script_get_history(scripts.iter().map(|s| s.as_script()))
        .map_err(|e| TrackerError::ChainService(format!("get_history: {}", e)))?;

    let mut seen: HashSet<Txid> = HashSet::new();
    let mut wanted: Vec<(Txid, u32)> = Vec::new();

    for entry in histories.into_iter().flatten() {
        // 0 and -1 are mempool entries
        if entry.height <= 0 {
            continue;
        }
        let height = entry.height as u32;
        if height >= min_height && seen.insert(entry.tx_hash) {
            wanted.push((entry.tx_hash, height));
        }
    }

    log::debug!(
        "[ELECTRUM] {} scripts -> {} txs at or above {}",
        scripts.len(),
        wanted.len(),
        min_height
    );

    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let raws = client
        .batch_transaction_get_raw(wanted.iter().map(|(txid, _)| txid))
        .map_err(|e| TrackerError::ChainService(format!("transaction_get: {}", e)))?;

    Ok(wanted
        .iter()
        .zip(raws)
        .map(|((_, height), raw)| RawTxInfo {
            tx_hex: hex::encode(raw),
            block_height: *height,
        })
        .collect())
}

impl ChainApi for ElectrumChainClient {
    async fn latest_height(&self) -> Result<u32> {
        let client = self.inner.clone();
        let tip = tokio::task::spawn_blocking(move || client.block_headers_subscribe())
            .await
            .map_err(|e| TrackerError::ChainService(format!("height task: {}", e)))?
            .map_err(|e| TrackerError::ChainService(format!("headers.subscribe: {}", e)))?;

        log::trace!("[ELECTRUM] tip height {}", tip.height);
        u32::try_from(tip.height)
            .map_err(|_| TrackerError::ChainService(format!("tip height {} out of range", tip.height)))
    }

    async fn transactions_for(&self, addresses: &[String], min_height: u32) -> Result<Vec<RawTxInfo>> {
        let scripts = addresses
            .iter()
            .map(|a| script_for_address(a, self.network))
            .collect::<Result<Vec<_>>>()?;

        let client = self.inner.clone();
        tokio::task::spawn_blocking(move || fetch_history(&client, &scripts, min_height))
            .await
            .map_err(|e| TrackerError::ChainService(format!("history task: {}", e)))?
    }
}
