use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bitcoin::Network;
use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, OnceCell, RwLock};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::persistence::{KvStore, TrackerStore};
use crate::tracker::chain::ChainApi;
use crate::tracker::domain::{
    checked_address, parse_tx_for_network, AddressRecord, AddressWithTransactions,
    TransactionRecord,
};
use crate::tracker::engine::{apply_batch_results, merge_records, plan_batches, Batch};

/// Where the tracker currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TrackerPhase {
    Uninitialized = 0,
    Loading = 1,
    Idle = 2,
    /// Sync pass, asking the chain service for its tip.
    RefreshingHeight = 3,
    /// Sync pass, batches in flight.
    FetchingBatches = 4,
}

impl TrackerPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => TrackerPhase::Loading,
            2 => TrackerPhase::Idle,
            3 => TrackerPhase::RefreshingHeight,
            4 => TrackerPhase::FetchingBatches,
            _ => TrackerPhase::Uninitialized,
        }
    }
}

/// What one successful sync pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub chain_height: u32,
    pub batches: usize,
    /// Parsed transactions written, counted once per batch that returned them.
    pub transactions: usize,
    pub addresses_updated: usize,
    /// Transactions returned by the chain service that failed to parse.
    pub skipped_transactions: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct BatchOutcome {
    transactions: usize,
    skipped: usize,
    updated: Vec<AddressRecord>,
}

/// State loaded once from the store on first use.
struct TrackerState {
    /// The watch set. Replaced wholesale after each merge, never edited in place.
    watched: RwLock<Arc<Vec<AddressRecord>>>,
    chain_height: RwLock<u32>,
}

/// **AddressTracker**
///
/// The imperative shell around the planner and merge core. It:
/// 1. **Loads** the watch set and last chain height from the store, once.
/// 2. **Syncs**: refreshes the chain tip, plans batches, fetches them with bounded
///    parallelism, parses, merges and writes each batch atomically.
/// 3. **Serves reads** from the in-memory watch set and the store. Reads never write.
///
/// Single process only: two trackers sharing one store are not coordinated.
pub struct AddressTracker<S, C> {
    store: TrackerStore<S>,
    chain: C,
    config: TrackerConfig,
    network: Network,
    state: OnceCell<TrackerState>,
    phase: AtomicU8,
    /// One sync pass at a time.
    pass: Mutex<()>,
}

impl<S, C> AddressTracker<S, C>
where
    S: KvStore,
    C: ChainApi,
{
    /// Validates `config` and the store encoding. Nothing is loaded until first use.
    pub fn new(store: S, chain: C, config: TrackerConfig) -> Result<Self> {
        let network = config.validate()?;
        let store = TrackerStore::new(store)?;

        Ok(Self {
            store,
            chain,
            config,
            network,
            state: OnceCell::new(),
            phase: AtomicU8::new(TrackerPhase::Uninitialized as u8),
            pass: Mutex::new(()),
        })
    }

    pub fn phase(&self) -> TrackerPhase {
        TrackerPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    fn set_phase(&self, phase: TrackerPhase) {
        log::trace!("[TRACKER] phase -> {:?}", phase);
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    // =====================================================================
    // Initialization
    // =====================================================================

    /// Loads state on the first call. Concurrent first callers wait on the same load.
    async fn init(&self) -> Result<&TrackerState> {
        self.state
            .get_or_try_init(|| async {
                self.set_phase(TrackerPhase::Loading);

                let loaded = self.store.load_addresses().and_then(|addrs| {
                    let height = self.store.load_chain_height()?;
                    Ok((addrs, height))
                });

                let (addrs, height) = match loaded {
                    Ok(v) => v,
                    Err(e) => {
                        self.set_phase(TrackerPhase::Uninitialized);
                        return Err(e);
                    }
                };

                log::info!(
                    "[TRACKER] Loaded {} watched addresses, chain height {}",
                    addrs.len(),
                    height
                );
                self.set_phase(TrackerPhase::Idle);

                Ok(TrackerState {
                    watched: RwLock::new(Arc::new(merge_records(&[], &addrs))),
                    chain_height: RwLock::new(height),
                })
            })
            .await
    }

    async fn snapshot(&self) -> Result<Arc<Vec<AddressRecord>>> {
        let state = self.init().await?;
        let watched = state.watched.read().await;
        Ok(Arc::clone(&watched))
    }

    // =====================================================================
    // Watching
    // =====================================================================

    /// Starts watching `addresses`. Already watched ones are ignored.
    ///
    /// Returns how many addresses were newly added. Fails without watching anything if
    /// one of them is not an address of the configured network.
    ///
    /// Addresses are stored in their canonical form (lowercase bech32), the form the
    /// parser reports senders and receivers in.
    pub async fn watch_addresses<A: AsRef<str>>(&self, addresses: &[A]) -> Result<usize> {
        let canonical = addresses
            .iter()
            .map(|a| Ok(checked_address(a.as_ref(), self.network)?.to_string()))
            .collect::<Result<Vec<String>>>()?;

        let state = self.init().await?;
        let mut watched = state.watched.write().await;

        let mut fresh: Vec<AddressRecord> = Vec::new();
        for a in canonical {
            let known = watched.iter().any(|r| r.address == a)
                || fresh.iter().any(|r| r.address == a);
            if !known {
                fresh.push(AddressRecord::new(a));
            }
        }

        if fresh.is_empty() {
            log::debug!("[TRACKER] watch: nothing new");
            return Ok(0);
        }

        let ops = fresh
            .iter()
            .map(|r| self.store.address_op(r))
            .collect::<Result<Vec<_>>>()?;
        self.store.write_batch(ops)?;

        let merged = merge_records(&watched, &fresh);
        *watched = Arc::new(merged);

        log::info!("[TRACKER] Watching {} new addresses ({} total)", fresh.len(), watched.len());
        Ok(fresh.len())
    }

    // =====================================================================
    // Sync
    // =====================================================================

    /// Runs one sync pass.
    ///
    /// Batches fail independently: the ones that succeed stay persisted and merged even
    /// when another batch fails, in which case [`TrackerError::PartialSync`] is returned.
    pub async fn sync(&self) -> Result<SyncReport> {
        let state = self.init().await?;
        let _pass = self.pass.lock().await;

        self.set_phase(TrackerPhase::RefreshingHeight);
        let result = self.run_pass(state).await;
        self.set_phase(TrackerPhase::Idle);

        match &result {
            Ok(report) => log::info!(
                "[TRACKER] Sync done at height {}: {} batches, {} txs, {} addresses updated in {:?}",
                report.chain_height,
                report.batches,
                report.transactions,
                report.addresses_updated,
                report.elapsed
            ),
            Err(e) => log::warn!("[TRACKER] Sync failed: {}", e),
        }

        result
    }

    async fn run_pass(&self, state: &TrackerState) -> Result<SyncReport> {
        let t0 = Instant::now();

        let height = self.chain.latest_height().await?;
        {
            let mut current = state.chain_height.write().await;
            if *current != height {
                self.store.put_chain_height(height)?;
                log::info!("[TRACKER] Chain height {} -> {}", *current, height);
                *current = height;
            } else {
                // new addresses may still need their first scan
                log::debug!("[TRACKER] Chain height unchanged at {}", height);
            }
        }

        let watched = Arc::clone(&*state.watched.read().await);
        let batches = plan_batches(
            &watched,
            height,
            self.config.batch_size,
            self.config.confirmed_after,
        );
        let total = batches.len();
        log::debug!(
            "[TRACKER] {} of {} addresses behind, {} batches",
            batches.iter().map(Batch::len).sum::<usize>(),
            watched.len(),
            total
        );

        self.set_phase(TrackerPhase::FetchingBatches);
        let outcomes: Vec<Result<BatchOutcome>> = stream::iter(batches.into_iter().enumerate())
            .map(|(i, batch)| self.run_batch(i, batch))
            .buffer_unordered(self.config.max_concurrent_batches)
            .collect()
            .await;

        let mut report = SyncReport {
            chain_height: height,
            batches: total,
            ..SyncReport::default()
        };
        let mut updates: Vec<AddressRecord> = Vec::new();
        let mut failed = 0;
        let mut first_error: Option<TrackerError> = None;

        for outcome in outcomes {
            match outcome {
                Ok(o) => {
                    report.transactions += o.transactions;
                    report.skipped_transactions += o.skipped;
                    report.addresses_updated += o.updated.len();
                    updates.extend(o.updated);
                }
                Err(e) => {
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        if !updates.is_empty() {
            let mut current = state.watched.write().await;
            let merged = merge_records(&current, &updates);
            *current = Arc::new(merged);
        }

        report.elapsed = t0.elapsed();

        match first_error {
            Some(source) => Err(TrackerError::PartialSync {
                failed,
                total,
                source: Box::new(source),
            }),
            None => Ok(report),
        }
    }

    async fn run_batch(&self, index: usize, batch: Batch) -> Result<BatchOutcome> {
        let addresses = batch.addresses();
        log::debug!(
            "[BATCH {}] {} addresses from height {}",
            index,
            addresses.len(),
            batch.min_height
        );

        let infos = match self.chain.transactions_for(&addresses, batch.min_height).await {
            Ok(infos) => infos,
            Err(e) => {
                log::warn!("[BATCH {}] fetch failed, nothing written: {}", index, e);
                return Err(e);
            }
        };

        if infos.is_empty() {
            log::trace!("[BATCH {}] no transactions", index);
            return Ok(BatchOutcome::default());
        }

        let mut txs: Vec<TransactionRecord> = Vec::with_capacity(infos.len());
        let mut skipped = 0;
        for info in &infos {
            match parse_tx_for_network(info, self.network) {
                Ok(tx) => txs.push(tx),
                Err(e) => {
                    skipped += 1;
                    log::warn!(
                        "[BATCH {}] skipping transaction at height {}: {}",
                        index,
                        info.block_height,
                        e
                    );
                }
            }
        }

        let updated = apply_batch_results(&batch.records, &txs);

        let mut ops = Vec::with_capacity(txs.len() + updated.len());
        for tx in &txs {
            ops.push(self.store.transaction_op(tx)?);
        }
        for rec in &updated {
            log::trace!(
                "[BATCH {}] {} -> height {}, {} txs",
                index,
                rec.address,
                rec.max_block_height,
                rec.tx_ids.len()
            );
            ops.push(self.store.address_op(rec)?);
        }
        self.store.write_batch(ops)?;

        log::debug!(
            "[BATCH {}] wrote {} txs, {} address records",
            index,
            txs.len(),
            updated.len()
        );

        Ok(BatchOutcome {
            transactions: txs.len(),
            skipped,
            updated,
        })
    }

    // =====================================================================
    // Reads
    // =====================================================================

    pub async fn get_watched_addresses(&self) -> Result<Vec<AddressRecord>> {
        Ok(self.snapshot().await?.as_ref().clone())
    }

    pub async fn get_address(&self, address: &str) -> Result<AddressRecord> {
        let address = self.canonical(address);
        self.snapshot()
            .await?
            .iter()
            .find(|r| r.address == address)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("address {}", address)))
    }

    pub async fn get_address_with_transactions(&self, address: &str) -> Result<AddressWithTransactions> {
        let record = self.get_address(address).await?;
        let txs = self.lookup_transactions(&record.tx_ids)?;
        Ok(AddressWithTransactions { record, txs })
    }

    pub async fn get_transactions_for_address(&self, address: &str) -> Result<Vec<TransactionRecord>> {
        let record = self.get_address(address).await?;
        self.lookup_transactions(&record.tx_ids)
    }

    pub async fn get_all_transactions(&self) -> Result<Vec<TransactionRecord>> {
        self.init().await?;
        self.store.all_transactions()
    }

    pub async fn get_transaction(&self, tx_id: &str) -> Result<TransactionRecord> {
        self.init().await?;
        self.store.get_transaction(tx_id)
    }

    pub async fn get_height(&self) -> Result<u32> {
        let state = self.init().await?;
        let height = *state.chain_height.read().await;
        Ok(height)
    }

    /// Canonical spelling of `address`, or `address` itself when it does not parse.
    fn canonical(&self, address: &str) -> String {
        checked_address(address, self.network)
            .map(|a| a.to_string())
            .unwrap_or_else(|_| address.to_string())
    }

    /// Resolves `tx_ids` in order; any unknown id is a `NotFound`.
    pub fn lookup_transactions(&self, tx_ids: &[String]) -> Result<Vec<TransactionRecord>> {
        tx_ids.iter().map(|id| self.store.get_transaction(id)).collect()
    }
}
