//! Persistent state.
//!
//! [`KvStore`] is the byte-level contract the tracker expects from a backing store:
//! point reads, ordered range scans and atomic multi-key batches. [`TrackerStore`]
//! layers typed JSON access and the key layout on top of it.

mod memory;
mod sled_store;
mod store;

#[cfg(test)]
mod tests;

pub use memory::MemoryStore;
pub use sled_store::SledStore;
pub use store::{TrackerStore, ADDRESS_PREFIX, CHAIN_HEIGHT_KEY, TX_PREFIX};

use crate::error::Result;

/// How a backing store encodes its values.
///
/// The tracker only works against stores holding JSON documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    Json,
    Binary,
    Utf8,
}

/// One operation of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Ordered byte-keyed store.
pub trait KvStore: Send + Sync {
    fn value_encoding(&self) -> ValueEncoding;

    /// Returns the value of `key`, `None` if absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Applies every operation or none of them.
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()>;

    /// All entries with `low < key < high`, in key order.
    fn range(&self, low: &[u8], high: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    fn value_encoding(&self) -> ValueEncoding {
        (**self).value_encoding()
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        (**self).write_batch(ops)
    }

    fn range(&self, low: &[u8], high: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        (**self).range(low, high)
    }
}
