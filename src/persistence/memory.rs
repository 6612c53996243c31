use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use crate::error::{Result, TrackerError};
use crate::persistence::{BatchOp, KvStore, ValueEncoding};

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// Store backed by a `BTreeMap`. Clones share the same map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<Entries>>,
    encoding: ValueEncoding,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_encoding(ValueEncoding::Json)
    }

    pub fn with_encoding(encoding: ValueEncoding) -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            encoding,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Applies `ops` to `entries` in order.
fn apply_ops(entries: &mut Entries, ops: Vec<BatchOp>) {
    for op in ops {
        match op {
            BatchOp::Put { key, value } => {
                entries.insert(key, value);
            }
            BatchOp::Delete { key } => {
                entries.remove(&key);
            }
        }
    }
}

/// Entries strictly between `low` and `high`.
fn scan(entries: &Entries, low: &[u8], high: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    if low >= high {
        return Vec::new();
    }

    entries
        .range::<[u8], _>((Bound::Excluded(low), Bound::Excluded(high)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl KvStore for MemoryStore {
    fn value_encoding(&self) -> ValueEncoding {
        self.encoding
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(|_| {
            TrackerError::Store("unable to acquire read lock on memory store".to_string())
        })?;

        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| {
            TrackerError::Store("unable to acquire write lock on memory store".to_string())
        })?;

        entries.insert(key.to_vec(), value);
        Ok(())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| {
            TrackerError::Store("unable to acquire write lock on memory store".to_string())
        })?;

        apply_ops(&mut entries, ops);
        Ok(())
    }

    fn range(&self, low: &[u8], high: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries.read().map_err(|_| {
            TrackerError::Store("unable to acquire read lock on memory store".to_string())
        })?;

        Ok(scan(&entries, low, high))
    }
}
