use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use bitcoin::Network;

use crate::error::{Result, TrackerError};
use crate::tracker::chain::ChainApi;
use crate::tracker::domain::{parse_tx_for_network, RawTxInfo};

struct ChainTx {
    info: RawTxInfo,
    touches: Vec<String>,
}

#[derive(Default)]
struct MockState {
    height: u32,
    txs: Vec<ChainTx>,
    fail_height: bool,
    fail_for: HashSet<String>,
    queries: Vec<(Vec<String>, u32)>,
}

/// Pure in-memory chain for tests and demos.
///
/// Transactions are visible once the chain height reaches their block. Clones share
/// the same chain, so a test can keep a handle and advance it under a running tracker.
#[derive(Clone)]
pub struct MockChainClient {
    network: Network,
    state: Arc<Mutex<MockState>>,
}

impl MockChainClient {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> Result<R> {
        let mut s = self
            .state
            .lock()
            .map_err(|_| TrackerError::ChainService("mock chain lock poisoned".to_string()))?;
        Ok(f(&mut s))
    }

    pub fn set_height(&self, height: u32) -> Result<()> {
        self.with_state(|s| {
            if height < s.height {
                log::warn!("[MOCK] chain height going backwards {} -> {}", s.height, height);
            }
            s.height = height;
        })
    }

    pub fn height(&self) -> Result<u32> {
        self.with_state(|s| s.height)
    }

    /// Adds a transaction; the addresses it touches are taken from parsing it.
    pub fn push_tx(&self, info: RawTxInfo) -> Result<()> {
        let parsed = parse_tx_for_network(&info, self.network)?;
        let mut touches = parsed.from.addresses;
        touches.extend(parsed.to.addresses);
        self.push_raw(info, touches)
    }

    /// Adds a transaction reported for `touches` without parsing it, so undecodable
    /// payloads can be served.
    pub fn push_raw(&self, info: RawTxInfo, touches: Vec<String>) -> Result<()> {
        self.with_state(|s| s.txs.push(ChainTx { info, touches }))
    }

    pub fn fail_latest_height(&self, fail: bool) -> Result<()> {
        self.with_state(|s| s.fail_height = fail)
    }

    /// Any transaction query that includes `address` fails.
    pub fn fail_queries_for(&self, address: impl Into<String>) -> Result<()> {
        self.with_state(|s| {
            s.fail_for.insert(address.into());
        })
    }

    pub fn clear_failures(&self) -> Result<()> {
        self.with_state(|s| {
            s.fail_for.clear();
            s.fail_height = false;
        })
    }

    /// `(addresses, min_height)` of every transaction query so far.
    pub fn queries(&self) -> Result<Vec<(Vec<String>, u32)>> {
        self.with_state(|s| s.queries.clone())
    }
}

impl ChainApi for MockChainClient {
    async fn latest_height(&self) -> Result<u32> {
        self.with_state(|s| {
            if s.fail_height {
                Err(TrackerError::ChainService("latest height unavailable".to_string()))
            } else {
                Ok(s.height)
            }
        })?
    }

    async fn transactions_for(&self, addresses: &[String], min_height: u32) -> Result<Vec<RawTxInfo>> {
        // let other batches interleave like a real network call would
        tokio::task::yield_now().await;

        self.with_state(|s| {
            s.queries.push((addresses.to_vec(), min_height));

            if let Some(bad) = addresses.iter().find(|a| s.fail_for.contains(*a)) {
                return Err(TrackerError::ChainService(format!("query failed for {}", bad)));
            }

            Ok(s.txs
                .iter()
                .filter(|tx| tx.info.block_height >= min_height && tx.info.block_height <= s.height)
                .filter(|tx| addresses.iter().any(|a| tx.touches.contains(a)))
                .map(|tx| tx.info.clone())
                .collect())
        })?
    }
}
