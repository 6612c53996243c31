//! Builders for deterministic keys, addresses and transactions used across tests.

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, CompressedPublicKey, Network, OutPoint, PublicKey, Sequence, Transaction, TxIn, TxOut, Txid, Witness};

use crate::tracker::domain::{AddressRecord, RawTxInfo};

pub const NETWORK: Network = Network::Testnet;

/// Real testnet transaction layout: one P2PKH spend by an uncompressed key, one input
/// with an empty script_sig, two P2PKH outputs and an OP_RETURN.
pub const FIXTURE_TX_HEX: &str = "0100000002000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f000000008a4730440102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f40414243440141040cfa3dfb357bdff37c8748c7771e173453da5d7caa32972ab2f5c888fff5bbaeb5fc812b473bf808206930fade81ef4e373e60039886b51022ce68902d96ef70ffffffff202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f0100000000ffffffff03a0860100000000001976a914a9431895feb4321991cbe12ca086e2073b64a94588acc8af0000000000001976a91461b469ada61f37c620010912a9d5d56646015f1688ac0000000000000000066a047465737400000000";
pub const FIXTURE_TXID: &str = "8612a2221a02395133b27efd4817ec0682d57252d6244d9ad88a8bd39427b70a";
pub const FIXTURE_PUBKEY: &str = "040cfa3dfb357bdff37c8748c7771e173453da5d7caa32972ab2f5c888fff5bbaeb5fc812b473bf808206930fade81ef4e373e60039886b51022ce68902d96ef70";
pub const FIXTURE_SENDER: &str = "mpRZxxp5FtmQipEWJPa1NY9FmPsva3exUd";
pub const FIXTURE_RECEIVER: &str = "mvwvsPT2J3VPEaYmFdExFc4iBGRRK2Vdkd";

/// Compressed key derived from the secret `[n; 32]`. `n` must be non-zero.
pub fn pubkey(n: u8) -> PublicKey {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&[n; 32]).unwrap();
    PublicKey::new(bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &sk))
}

pub fn address(n: u8) -> String {
    Address::p2pkh(pubkey(n).pubkey_hash(), NETWORK).to_string()
}

/// Native segwit address of key `n`.
pub fn p2wpkh_address(n: u8) -> String {
    Address::p2wpkh(&CompressedPublicKey(pubkey(n).inner), NETWORK).to_string()
}

fn p2pkh_script(n: u8) -> bitcoin::ScriptBuf {
    Address::p2pkh(pubkey(n).pubkey_hash(), NETWORK).script_pubkey()
}

/// P2PKH transaction spent by key `from`, paying every key in `to`.
/// `salt` keeps txids distinct between otherwise identical transactions.
pub fn p2pkh_tx(from: u8, to: &[u8], salt: u32) -> Transaction {
    let sig = PushBytesBuf::try_from(vec![0x30; 71]).unwrap();
    let script_sig = Builder::new()
        .push_slice(sig)
        .push_key(&pubkey(from))
        .into_script();

    Transaction {
        version: Version(1),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: Txid::all_zeros(),
                vout: salt,
            },
            script_sig,
            sequence: Sequence::MAX,
            witness: Witness::default(),
        }],
        output: to
            .iter()
            .map(|n| TxOut {
                value: Amount::from_sat(10_000),
                script_pubkey: p2pkh_script(*n),
            })
            .collect(),
    }
}

pub fn raw(tx: &Transaction, block_height: u32) -> RawTxInfo {
    RawTxInfo {
        tx_hex: serialize_hex(tx),
        block_height,
    }
}

pub fn raw_p2pkh(from: u8, to: &[u8], salt: u32, block_height: u32) -> RawTxInfo {
    raw(&p2pkh_tx(from, to, salt), block_height)
}

pub fn record(address: &str, max_block_height: u32) -> AddressRecord {
    AddressRecord {
        address: address.to_string(),
        tx_ids: Vec::new(),
        max_block_height,
    }
}

pub fn record_with(address: &str, max_block_height: u32, tx_ids: &[&str]) -> AddressRecord {
    AddressRecord {
        address: address.to_string(),
        tx_ids: tx_ids.iter().map(|s| s.to_string()).collect(),
        max_block_height,
    }
}

/// P2PKH spend by key `from` paying the P2WPKH address of key `to`.
pub fn raw_paying_p2wpkh(from: u8, to: u8, salt: u32, block_height: u32) -> RawTxInfo {
    let mut tx = p2pkh_tx(from, &[], salt);
    tx.output.push(TxOut {
        value: Amount::from_sat(10_000),
        script_pubkey: Address::p2wpkh(&CompressedPublicKey(pubkey(to).inner), NETWORK)
            .script_pubkey(),
    });
    raw(&tx, block_height)
}
