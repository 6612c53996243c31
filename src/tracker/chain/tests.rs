#![cfg(test)]
use bitcoin::Network;

use crate::error::TrackerError;
use crate::test_utils::*;
use crate::tracker::chain::electrum::script_for_address;
use crate::tracker::chain::{ChainApi, MockChainClient};
use crate::tracker::domain::RawTxInfo;

#[test]
fn script_for_testnet_address() {
    let script = script_for_address(FIXTURE_SENDER, Network::Testnet).unwrap();
    assert!(script.is_p2pkh());
}

#[test]
fn script_for_wrong_network_is_rejected() {
    let err = script_for_address(FIXTURE_SENDER, Network::Bitcoin).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidAddress { .. }));

    let err = script_for_address("not-an-address", Network::Testnet).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidAddress { .. }));
}

#[tokio::test]
async fn mock_hides_transactions_above_tip() {
    let chain = MockChainClient::new(NETWORK);
    chain.push_tx(raw_p2pkh(1, &[2], 0, 10)).unwrap();
    chain.push_tx(raw_p2pkh(1, &[2], 1, 20)).unwrap();

    let a = vec![address(1)];
    assert!(chain.transactions_for(&a, 0).await.unwrap().is_empty());

    chain.set_height(15).unwrap();
    assert_eq!(chain.latest_height().await.unwrap(), 15);
    assert_eq!(chain.transactions_for(&a, 0).await.unwrap().len(), 1);

    chain.set_height(25).unwrap();
    assert_eq!(chain.transactions_for(&a, 0).await.unwrap().len(), 2);
    assert_eq!(chain.transactions_for(&a, 11).await.unwrap().len(), 1);
    assert!(chain.transactions_for(&[address(3)], 0).await.unwrap().is_empty());

    let queries = chain.queries().unwrap();
    assert_eq!(queries.len(), 5);
    assert_eq!(queries[3], (a.clone(), 11));
}

#[tokio::test]
async fn mock_failures_are_chain_service_errors() {
    let chain = MockChainClient::new(NETWORK);
    chain.fail_latest_height(true).unwrap();
    assert!(matches!(
        chain.latest_height().await,
        Err(TrackerError::ChainService(_))
    ));

    chain.fail_queries_for(address(2)).unwrap();
    let err = chain
        .transactions_for(&[address(1), address(2)], 0)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::ChainService(_)));

    chain.clear_failures().unwrap();
    assert!(chain.transactions_for(&[address(2)], 0).await.is_ok());
}

#[test]
fn mock_rejects_unparsable_push_tx() {
    let chain = MockChainClient::new(NETWORK);
    let bad = RawTxInfo {
        tx_hex: "00".to_string(),
        block_height: 1,
    };
    assert!(matches!(chain.push_tx(bad.clone()), Err(TrackerError::Parse(_))));
    assert!(chain.push_raw(bad, vec![address(1)]).is_ok());
}
