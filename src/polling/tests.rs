#![cfg(test)]
use std::time::Duration;

use crate::config::TrackerConfig;
use crate::persistence::MemoryStore;
use crate::polling::follow;
use crate::test_utils::*;
use crate::tracker::chain::MockChainClient;
use crate::tracker::runtime::AddressTracker;

#[tokio::test]
async fn follow_runs_the_requested_rounds() {
    let chain = MockChainClient::new(NETWORK);
    let tracker =
        AddressTracker::new(MemoryStore::new(), chain.clone(), TrackerConfig::default()).unwrap();
    let a = address(1);
    tracker.watch_addresses(&[&a]).await.unwrap();
    chain.push_tx(raw_p2pkh(1, &[2], 0, 3)).unwrap();
    chain.set_height(3).unwrap();

    let stats = follow(&tracker, Duration::from_millis(1), Some(3)).await;

    assert_eq!(stats.rounds, 3);
    assert_eq!(stats.failed_rounds, 0);
    assert_eq!(tracker.get_transactions_for_address(&a).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_rounds_do_not_stop_following() {
    let chain = MockChainClient::new(NETWORK);
    let tracker =
        AddressTracker::new(MemoryStore::new(), chain.clone(), TrackerConfig::default()).unwrap();
    chain.fail_latest_height(true).unwrap();

    let stats = follow(&tracker, Duration::from_millis(1), Some(2)).await;

    assert_eq!(stats.rounds, 2);
    assert_eq!(stats.failed_rounds, 2);
}

#[tokio::test]
async fn zero_rounds_returns_immediately() {
    let tracker = AddressTracker::new(
        MemoryStore::new(),
        MockChainClient::new(NETWORK),
        TrackerConfig::default(),
    )
    .unwrap();

    let stats = follow(&tracker, Duration::from_secs(3600), Some(0)).await;
    assert_eq!(stats.rounds, 0);
}
