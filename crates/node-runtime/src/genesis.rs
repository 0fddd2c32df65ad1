//! # Genesis Block
//!
//! Builds the fixed first block of the chain from configuration. The
//! genesis block carries one registration transaction per configured
//! delegate so replaying it seeds the delegate registry.

use shared_crypto::sha256;
use shared_types::{Block, DelegateAsset, Transaction};

/// Build the genesis block for `timestamp` with the given delegate
/// registrations. Deterministic: two nodes with the same configuration
/// produce the same genesis id.
pub fn build_genesis(timestamp: u64, delegates: &[(String, [u8; 32])]) -> Block {
    let transactions: Vec<Transaction> = delegates
        .iter()
        .map(|(username, public_key)| {
            let mut payload = Vec::with_capacity(64 + username.len());
            payload.extend_from_slice(b"genesis-registration");
            payload.extend_from_slice(public_key);
            payload.extend_from_slice(username.as_bytes());
            Transaction {
                id: sha256(&payload),
                sender_public_key: *public_key,
                recipient: None,
                amount: 0,
                fee: 0,
                timestamp,
                delegate: Some(DelegateAsset {
                    username: username.clone(),
                }),
                signature: [0; 64],
            }
        })
        .collect();

    let mut payload = Vec::new();
    payload.extend_from_slice(b"genesis-block");
    payload.extend_from_slice(&timestamp.to_be_bytes());
    for transaction in &transactions {
        payload.extend_from_slice(&transaction.id);
    }

    Block {
        id: sha256(&payload),
        height: 1,
        timestamp,
        previous_block: None,
        generator_public_key: delegates.first().map(|(_, pk)| *pk).unwrap_or([0; 32]),
        total_fee: 0,
        transactions,
    }
}
