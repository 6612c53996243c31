use std::cmp::Ordering;
use std::collections::HashSet;

use crate::tracker::domain::{AddressRecord, TransactionRecord};

/// Merge-join of two record sets by address.
///
/// On a shared address the record with the higher `max_block_height` wins; on equal
/// height the `existing` record is kept. The winner also keeps any tx ids only the
/// other side knew about, appended after its own, so a merge never drops an id.
/// Addresses present on one side only pass through. The result is sorted by address
/// and holds every address once.
pub fn merge_records(existing: &[AddressRecord], updates: &[AddressRecord]) -> Vec<AddressRecord> {
    let mut left: Vec<&AddressRecord> = existing.iter().collect();
    let mut right: Vec<&AddressRecord> = updates.iter().collect();
    left.sort_by(|a, b| a.address.cmp(&b.address));
    right.sort_by(|a, b| a.address.cmp(&b.address));

    let mut merged: Vec<AddressRecord> = Vec::with_capacity(left.len().max(right.len()));
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        let (l, r) = (left[i], right[j]);
        match l.address.cmp(&r.address) {
            Ordering::Less => {
                push_unique(&mut merged, l);
                i += 1;
            }
            Ordering::Greater => {
                push_unique(&mut merged, r);
                j += 1;
            }
            Ordering::Equal => {
                push_unique(&mut merged, l);
                push_unique(&mut merged, r);
                i += 1;
                j += 1;
            }
        }
    }

    // leftovers
    for rec in left[i..].iter().chain(right[j..].iter()) {
        push_unique(&mut merged, rec);
    }

    merged
}

/// Sorted input makes a repeated address always land right after its first copy.
fn push_unique(merged: &mut Vec<AddressRecord>, rec: &AddressRecord) {
    match merged.last_mut() {
        Some(last) if last.address == rec.address => *last = combine(last, rec),
        _ => merged.push(rec.clone()),
    }
}

/// `kept` is the side seen first, i.e. the existing one.
fn combine(kept: &AddressRecord, other: &AddressRecord) -> AddressRecord {
    let (winner, loser) = if other.max_block_height > kept.max_block_height {
        (other, kept)
    } else {
        (kept, other)
    };

    AddressRecord {
        address: winner.address.clone(),
        tx_ids: merge_tx_ids(&winner.tx_ids, &loser.tx_ids),
        max_block_height: winner.max_block_height,
    }
}

/// Ordered set union: `base` unchanged, followed by ids from `new_ids` not seen yet.
pub fn merge_tx_ids(base: &[String], new_ids: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = base.iter().map(String::as_str).collect();
    let mut merged = base.to_vec();

    for id in new_ids {
        if seen.insert(id.as_str()) {
            merged.push(id.clone());
        }
    }

    merged
}

/// Folds one batch's fetched transactions into that batch's records.
///
/// Every member's height is raised to the highest block among *all* fetched
/// transactions, whether or not that transaction touches the member. Its `tx_ids`
/// only gain the transactions it sends or receives in. Members that come out
/// unchanged are dropped so they are not rewritten.
pub fn apply_batch_results(
    records: &[AddressRecord],
    txs: &[TransactionRecord],
) -> Vec<AddressRecord> {
    let batch_height = txs.iter().map(|tx| tx.block_height).max().unwrap_or(0);

    records
        .iter()
        .filter_map(|rec| {
            let touching: Vec<String> = txs
                .iter()
                .filter(|tx| tx.touches(&rec.address))
                .map(|tx| tx.tx_id.clone())
                .collect();

            let updated = AddressRecord {
                address: rec.address.clone(),
                tx_ids: merge_tx_ids(&rec.tx_ids, &touching),
                max_block_height: rec.max_block_height.max(batch_height),
            };

            (updated != *rec).then_some(updated)
        })
        .collect()
}
