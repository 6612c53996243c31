//! Value types shared by every tracker component, and the transaction parser.

pub mod parser;
pub mod records;


pub use parser::{checked_address, network_from_name, parse_tx, parse_tx_for_network};
pub use records::{AddressRecord, AddressWithTransactions, RawTxInfo, TransactionRecord, TxReceivers, TxSenders};
