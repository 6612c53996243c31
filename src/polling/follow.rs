// Periodic sync loop on top of AddressTracker

use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use crate::persistence::KvStore;
use crate::tracker::chain::ChainApi;
use crate::tracker::runtime::AddressTracker;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowStats {
    pub rounds: usize,
    pub failed_rounds: usize,
    pub total_time: Duration,
}

/// Runs `sync` every `interval`, `rounds` times, or forever when `rounds` is `None`.
///
/// The first round starts immediately. A failed round is logged and the loop goes on.
pub async fn follow<S, C>(
    tracker: &AddressTracker<S, C>,
    interval: Duration,
    rounds: Option<usize>,
) -> FollowStats
where
    S: KvStore,
    C: ChainApi,
{
    log::info!("[FOLLOW] Following chain every {:?} ...", interval);
    let global_start = Instant::now();
    let mut stats = FollowStats::default();

    // tokio rejects a zero period
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    // a slow pass should not be followed by a burst of catch-up passes
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if rounds.is_some_and(|max| stats.rounds >= max) {
            break;
        }
        ticker.tick().await;

        stats.rounds += 1;
        let round = stats.rounds;
        log::info!("[FOLLOW] Sync round #{} ...", round);
        let round_start = Instant::now();

        match tracker.sync().await {
            Ok(report) => log::info!(
                "[FOLLOW] Round #{} done in {:?}: height {}, {} txs",
                round,
                round_start.elapsed(),
                report.chain_height,
                report.transactions
            ),
            Err(e) => {
                stats.failed_rounds += 1;
                log::warn!("[FOLLOW] Round #{} failed after {:?}: {}", round, round_start.elapsed(), e);
            }
        }
    }

    stats.total_time = global_start.elapsed();
    stats
}
