#![cfg(test)]
use crate::error::TrackerError;
use crate::persistence::{BatchOp, KvStore, MemoryStore, SledStore, TrackerStore, ValueEncoding};
use crate::test_utils::*;
use crate::tracker::domain::parse_tx;

fn put(key: &str, value: &str) -> BatchOp {
    BatchOp::Put {
        key: key.as_bytes().to_vec(),
        value: value.as_bytes().to_vec(),
    }
}

fn keys(entries: Vec<(Vec<u8>, Vec<u8>)>) -> Vec<String> {
    entries
        .into_iter()
        .map(|(k, _)| String::from_utf8(k).unwrap())
        .collect()
}

// =========================================================================
// MemoryStore
// =========================================================================

#[test]
fn range_excludes_both_bounds() {
    let store = MemoryStore::new();
    store
        .write_batch(vec![put("a", "1"), put("a!x", "2"), put("a!y", "3"), put("b", "4")])
        .unwrap();

    assert_eq!(keys(store.range(b"a", b"b").unwrap()), vec!["a!x", "a!y"]);
    assert_eq!(keys(store.range(b"a!x", b"b").unwrap()), vec!["a!y"]);
    assert!(store.range(b"b", b"a").unwrap().is_empty());
    assert!(store.range(b"a", b"a").unwrap().is_empty());
}

#[test]
fn batch_applies_in_order() {
    let store = MemoryStore::new();
    store
        .write_batch(vec![
            put("k", "1"),
            put("k", "2"),
            put("gone", "x"),
            BatchOp::Delete {
                key: b"gone".to_vec(),
            },
        ])
        .unwrap();

    assert_eq!(store.get(b"k").unwrap(), Some(b"2".to_vec()));
    assert_eq!(store.get(b"gone").unwrap(), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn clones_share_entries() {
    let store = MemoryStore::new();
    let other = store.clone();
    store.put(b"k", b"1".to_vec()).unwrap();
    assert_eq!(other.get(b"k").unwrap(), Some(b"1".to_vec()));
}

// =========================================================================
// TrackerStore
// =========================================================================

#[test]
fn facade_rejects_non_json_store() {
    let err = TrackerStore::new(MemoryStore::with_encoding(ValueEncoding::Binary)).unwrap_err();
    assert!(matches!(err, TrackerError::Configuration(_)));
}

#[test]
fn facade_defaults_and_missing_keys() {
    let store = TrackerStore::new(MemoryStore::new()).unwrap();

    assert_eq!(store.load_chain_height().unwrap(), 0);
    assert!(store.load_addresses().unwrap().is_empty());
    assert!(store.get_transaction(FIXTURE_TXID).unwrap_err().is_not_found());
    assert!(store.get::<u32>(b"missing").unwrap_err().is_not_found());

    store.put_chain_height(42).unwrap();
    assert_eq!(store.load_chain_height().unwrap(), 42);
}

#[test]
fn collections_do_not_overlap() {
    let store = TrackerStore::new(MemoryStore::new()).unwrap();
    let tx = parse_tx(&raw_p2pkh(1, &[2], 0, 7), "testnet").unwrap();
    let rec = record_with(&address(1), 7, &[&tx.tx_id]);

    store
        .write_batch(vec![
            store.address_op(&rec).unwrap(),
            store.transaction_op(&tx).unwrap(),
        ])
        .unwrap();
    store.put_chain_height(7).unwrap();

    assert_eq!(store.load_addresses().unwrap(), vec![rec.clone()]);
    assert_eq!(store.all_transactions().unwrap(), vec![tx.clone()]);
    assert_eq!(store.get_transaction(&tx.tx_id).unwrap(), tx);
}

#[test]
fn undecodable_value_is_an_encoding_error() {
    let kv = MemoryStore::new();
    kv.put(b"a!broken", b"{not json".to_vec()).unwrap();
    let store = TrackerStore::new(kv).unwrap();

    assert!(matches!(store.load_addresses(), Err(TrackerError::Encoding(_))));
}

// =========================================================================
// SledStore
// =========================================================================

#[test]
fn sled_range_and_batch_match_memory_store() {
    let sled = SledStore::temp().unwrap();
    let memory = MemoryStore::new();

    let ops = vec![
        put("a", "1"),
        put("a!x", "2"),
        put("a!y", "3"),
        put("b", "4"),
        BatchOp::Delete {
            key: b"a!y".to_vec(),
        },
    ];
    sled.write_batch(ops.clone()).unwrap();
    memory.write_batch(ops).unwrap();

    let bounds: [(&[u8], &[u8]); 4] = [(b"a", b"b"), (b"a!", b"a!\xff"), (b"b", b"a"), (b"", b"zz")];
    for (low, high) in bounds {
        assert_eq!(sled.range(low, high).unwrap(), memory.range(low, high).unwrap());
    }
    assert_eq!(keys(sled.range(b"a", b"b").unwrap()), vec!["a!x"]);
    assert_eq!(sled.get(b"a!y").unwrap(), None);
}

#[test]
fn sled_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker_db");

    let tx = parse_tx(&raw_p2pkh(3, &[4], 0, 12), "testnet").unwrap();
    let rec = record_with(&address(3), 12, &[&tx.tx_id]);
    {
        let store = TrackerStore::new(SledStore::open(&path).unwrap()).unwrap();
        assert!(store.load_addresses().unwrap().is_empty());
        store
            .write_batch(vec![
                store.address_op(&rec).unwrap(),
                store.transaction_op(&tx).unwrap(),
            ])
            .unwrap();
        store.put_chain_height(12).unwrap();
    }

    let reopened = TrackerStore::new(SledStore::open(&path).unwrap()).unwrap();
    assert_eq!(reopened.load_addresses().unwrap(), vec![rec]);
    assert_eq!(reopened.get_transaction(&tx.tx_id).unwrap(), tx);
    assert_eq!(reopened.load_chain_height().unwrap(), 12);
}
