use crate::tracker::domain::AddressRecord;

/// A group of addresses queried together, plus the height to query from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub records: Vec<AddressRecord>,
    pub min_height: u32,
}

impl Batch {
    pub fn addresses(&self) -> Vec<String> {
        self.records.iter().map(|r| r.address.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Splits the records that are behind `chain_height` into query batches.
///
/// Records are ordered by ascending `max_block_height` so addresses needing the same
/// start height share a batch. Each batch starts `confirmed_after` blocks below its
/// first (lowest) record, so transactions that were still unconfirmed during the last
/// scan are picked up once they settle.
pub fn plan_batches(
    records: &[AddressRecord],
    chain_height: u32,
    batch_size: usize,
    confirmed_after: u32,
) -> Vec<Batch> {
    let mut stale: Vec<AddressRecord> = records
        .iter()
        .filter(|r| r.max_block_height < chain_height)
        .cloned()
        .collect();

    // stable: equal heights keep their input order
    stale.sort_by_key(|r| r.max_block_height);

    stale
        .chunks(batch_size.max(1))
        .map(|chunk| Batch {
            min_height: chunk[0].max_block_height.saturating_sub(confirmed_after),
            records: chunk.to_vec(),
        })
        .collect()
}
