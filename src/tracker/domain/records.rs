use bitcoin::PublicKey;
use serde::{Deserialize, Serialize};

/// Scan state of one watched address.
///
/// `tx_ids` never holds duplicates and `max_block_height` never goes down. Both are
/// only ever changed through [`merge_records`](crate::tracker::engine::merge_records).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    pub tx_ids: Vec<String>,
    pub max_block_height: u32,
}

impl AddressRecord {
    /// Zero-state record for a freshly watched address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            tx_ids: Vec::new(),
            max_block_height: 0,
        }
    }
}

/// What the chain service returns for each matching transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxInfo {
    /// Consensus-serialized transaction, hex encoded.
    pub tx_hex: String,
    pub block_height: u32,
}

/// Spending side of a parsed transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSenders {
    pub pubkeys: Vec<PublicKey>,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceivers {
    pub addresses: Vec<String>,
}

/// A parsed transaction. Parsing the same raw info always yields the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub tx_id: String,
    pub tx_hex: String,
    pub block_height: u32,
    pub from: TxSenders,
    pub to: TxReceivers,
}

impl TransactionRecord {
    /// True if `address` sends or receives in this transaction.
    pub fn touches(&self, address: &str) -> bool {
        self.from.addresses.iter().any(|a| a == address)
            || self.to.addresses.iter().any(|a| a == address)
    }
}

/// An address record joined with the transactions it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressWithTransactions {
    #[serde(flatten)]
    pub record: AddressRecord,
    pub txs: Vec<TransactionRecord>,
}
