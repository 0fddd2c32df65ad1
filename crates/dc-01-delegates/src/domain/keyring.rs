//! # Forging Keyring
//!
//! The Ed25519 keypairs this node controls. A node forges only in slots
//! scheduled for a delegate whose keypair is present here.

use shared_crypto::ForgingKeypair;
use shared_types::PublicKey;
use std::collections::HashMap;

/// Keypairs held for forging, indexed by delegate public key.
#[derive(Default)]
pub struct ForgingKeyring {
    keypairs: HashMap<PublicKey, ForgingKeypair>,
}

impl ForgingKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive and hold a keypair from a secret phrase. Returns the delegate
    /// public key it controls.
    pub fn add_secret(&mut self, secret: &str) -> PublicKey {
        let keypair = ForgingKeypair::from_secret(secret);
        let public_key = keypair.public_key();
        self.keypairs.insert(public_key, keypair);
        public_key
    }

    /// Whether this node controls `public_key`.
    pub fn contains(&self, public_key: &PublicKey) -> bool {
        self.keypairs.contains_key(public_key)
    }

    pub fn get(&self, public_key: &PublicKey) -> Option<&ForgingKeypair> {
        self.keypairs.get(public_key)
    }

    pub fn is_empty(&self) -> bool {
        self.keypairs.is_empty()
    }
}
