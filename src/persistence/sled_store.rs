use std::ops::Bound;
use std::path::Path;

use crate::error::{Result, TrackerError};
use crate::persistence::{BatchOp, KvStore, ValueEncoding};

fn store_error(context: &str, e: sled::Error) -> TrackerError {
    TrackerError::Store(format!("{}: {}", context, e))
}

/// Durable store backed by Sled. Clones share the same database.
#[derive(Clone)]
pub struct SledStore(sled::Db);

impl SledStore {
    /// Opens (or creates) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())
            .map_err(|e| store_error(&format!("opening {:?}", path.as_ref()), e))?;

        log::info!("[STORE] Opened sled database at {:?}", path.as_ref());
        Ok(Self(db))
    }

    /// Creates a temporary instance, deleted once the last handle is dropped. Only for
    /// use in tests.
    pub fn temp() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| store_error("opening temporary database", e))?;

        Ok(Self(db))
    }

    fn flush(&self) -> Result<()> {
        let bytes = self.0.flush().map_err(|e| store_error("flush", e))?;
        log::trace!("[STORE] Flushed {} bytes", bytes);
        Ok(())
    }
}

impl KvStore for SledStore {
    fn value_encoding(&self) -> ValueEncoding {
        ValueEncoding::Json
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self.0.get(key).map_err(|e| store_error("get", e))?;
        Ok(value.map(|inner| inner.to_vec()))
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.0.insert(key, value).map_err(|e| store_error("insert", e))?;
        self.flush()
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let mut batch = sled::Batch::default();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => batch.insert(key, value),
                BatchOp::Delete { key } => batch.remove(key),
            }
        }

        self.0.apply_batch(batch).map_err(|e| store_error("apply_batch", e))?;
        self.flush()
    }

    fn range(&self, low: &[u8], high: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        if low >= high {
            return Ok(Vec::new());
        }

        self.0
            .range::<&[u8], _>((Bound::Excluded(low), Bound::Excluded(high)))
            .map(|entry| {
                let (k, v) = entry.map_err(|e| store_error("range", e))?;
                Ok((k.to_vec(), v.to_vec()))
            })
            .collect()
    }
}
