// Raw transaction -> TransactionRecord

use std::str::FromStr;

use bitcoin::script::Instruction;
use bitcoin::{Address, CompressedPublicKey, Network, PublicKey, Transaction, TxIn};

use crate::error::{ParseError, TrackerError};
use crate::tracker::domain::records::{RawTxInfo, TransactionRecord, TxReceivers, TxSenders};

/// Resolves a network name such as `testnet` or `bitcoin`.
pub fn network_from_name(name: &str) -> Result<Network, ParseError> {
    Network::from_str(name).map_err(|_| ParseError::UnknownNetwork(name.to_string()))
}

/// Parses `address` and checks it belongs to `network`.
pub fn checked_address(address: &str, network: Network) -> Result<Address, TrackerError> {
    let invalid = |reason: String| TrackerError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    Address::from_str(address)
        .map_err(|e| invalid(e.to_string()))?
        .require_network(network)
        .map_err(|e| invalid(e.to_string()))
}

/// Parses `info` for the network called `network_name`.
///
/// Fails only when the network is unknown or the payload does not decode. Inputs and
/// outputs that cannot be mapped to an address are left out of the result.
pub fn parse_tx(info: &RawTxInfo, network_name: &str) -> Result<TransactionRecord, ParseError> {
    let network = network_from_name(network_name)?;
    parse_tx_for_network(info, network)
}

pub fn parse_tx_for_network(
    info: &RawTxInfo,
    network: Network,
) -> Result<TransactionRecord, ParseError> {
    let bytes = hex::decode(info.tx_hex.trim()).map_err(|e| ParseError::Hex(e.to_string()))?;
    let tx: Transaction =
        bitcoin::consensus::deserialize(&bytes).map_err(|e| ParseError::Decode(e.to_string()))?;

    Ok(TransactionRecord {
        tx_id: tx.compute_txid().to_string(),
        tx_hex: info.tx_hex.clone(),
        block_height: info.block_height,
        from: parse_senders(&tx, network),
        to: TxReceivers {
            addresses: parse_receivers(&tx, network),
        },
    })
}

fn parse_senders(tx: &Transaction, network: Network) -> TxSenders {
    let mut senders = TxSenders::default();

    for input in &tx.input {
        if let Some((pubkey, address)) = input_sender(input, network) {
            senders.pubkeys.push(pubkey);
            senders.addresses.push(address.to_string());
        }
    }

    senders
}

/// P2PKH spends carry `<sig> <pubkey>` in the script_sig; P2WPKH spends carry the
/// same pair in the witness.
fn input_sender(input: &TxIn, network: Network) -> Option<(PublicKey, Address)> {
    if !input.script_sig.is_empty() {
        let push = match input.script_sig.instructions().nth(1) {
            Some(Ok(Instruction::PushBytes(bytes))) => bytes,
            _ => return None,
        };
        let pubkey = PublicKey::from_slice(push.as_bytes()).ok()?;
        let address = Address::p2pkh(pubkey.pubkey_hash(), network);
        return Some((pubkey, address));
    }

    if input.witness.len() == 2 {
        let compressed = CompressedPublicKey::from_slice(input.witness.nth(1)?).ok()?;
        let address = Address::p2wpkh(&compressed, network);
        return Some((PublicKey::new(compressed.0), address));
    }

    None
}

fn parse_receivers(tx: &Transaction, network: Network) -> Vec<String> {
    tx.output
        .iter()
        .filter_map(|out| Address::from_script(&out.script_pubkey, network).ok())
        .map(|addr| addr.to_string())
        .collect()
}
