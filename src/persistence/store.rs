use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::persistence::{BatchOp, KvStore, ValueEncoding};
use crate::tracker::domain::{AddressRecord, TransactionRecord};

/// Key prefix of watched address records.
pub const ADDRESS_PREFIX: &str = "a!";

/// Key prefix of parsed transactions.
pub const TX_PREFIX: &str = "t!";

/// Scalar key holding the last chain height synced against.
pub const CHAIN_HEIGHT_KEY: &str = "chainheight";

/// Typed JSON façade over a [`KvStore`].
///
/// Collections live under fixed single-character prefixes so a prefix scan only
/// touches one collection. There are no secondary indexes: the transactions of an
/// address are found by joining through [`AddressRecord::tx_ids`].
#[derive(Debug, Clone)]
pub struct TrackerStore<S> {
    kv: S,
}

fn address_key(address: &str) -> Vec<u8> {
    format!("{}{}", ADDRESS_PREFIX, address).into_bytes()
}

fn tx_key(tx_id: &str) -> Vec<u8> {
    format!("{}{}", TX_PREFIX, tx_id).into_bytes()
}

/// Exclusive upper bound for a prefix scan.
fn prefix_end(prefix: &str) -> Vec<u8> {
    let mut high = prefix.as_bytes().to_vec();
    high.push(0xff);
    high
}

impl<S: KvStore> TrackerStore<S> {
    /// Wraps `kv`, refusing stores that do not hold JSON values.
    pub fn new(kv: S) -> Result<Self> {
        let encoding = kv.value_encoding();
        if encoding != ValueEncoding::Json {
            return Err(TrackerError::Configuration(format!(
                "expected a store with JSON value encoding, got {:?}",
                encoding
            )));
        }

        Ok(Self { kv })
    }

    // =====================================================================
    // Generic typed access
    // =====================================================================

    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<T> {
        self.get_opt(key)?.ok_or_else(|| {
            TrackerError::NotFound(String::from_utf8_lossy(key).into_owned())
        })
    }

    pub fn get_opt<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.kv.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        self.kv.put(key, serde_json::to_vec(value)?)
    }

    pub fn write_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        self.kv.write_batch(ops)
    }

    pub fn range_scan<T: DeserializeOwned>(&self, low: &[u8], high: &[u8]) -> Result<Vec<T>> {
        self.kv
            .range(low, high)?
            .into_iter()
            .map(|(_, v)| serde_json::from_slice(&v).map_err(TrackerError::from))
            .collect()
    }

    fn scan_prefix<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        self.range_scan(prefix.as_bytes(), &prefix_end(prefix))
    }

    // =====================================================================
    // Collections
    // =====================================================================

    pub fn load_addresses(&self) -> Result<Vec<AddressRecord>> {
        self.scan_prefix(ADDRESS_PREFIX)
    }

    pub fn all_transactions(&self) -> Result<Vec<TransactionRecord>> {
        self.scan_prefix(TX_PREFIX)
    }

    pub fn get_transaction(&self, tx_id: &str) -> Result<TransactionRecord> {
        self.get_opt(&tx_key(tx_id))?
            .ok_or_else(|| TrackerError::NotFound(format!("transaction {}", tx_id)))
    }

    /// Missing height means nothing has been synced yet.
    pub fn load_chain_height(&self) -> Result<u32> {
        Ok(self.get_opt(CHAIN_HEIGHT_KEY.as_bytes())?.unwrap_or(0))
    }

    pub fn put_chain_height(&self, height: u32) -> Result<()> {
        self.put(CHAIN_HEIGHT_KEY.as_bytes(), &height)
    }

    pub fn address_op(&self, record: &AddressRecord) -> Result<BatchOp> {
        Ok(BatchOp::Put {
            key: address_key(&record.address),
            value: serde_json::to_vec(record)?,
        })
    }

    pub fn transaction_op(&self, record: &TransactionRecord) -> Result<BatchOp> {
        Ok(BatchOp::Put {
            key: tx_key(&record.tx_id),
            value: serde_json::to_vec(record)?,
        })
    }
}
