//! # Ed25519 Signatures
//!
//! Block signing and verification. Forging keypairs are derived from a
//! secret phrase: the SHA-256 digest of the phrase seeds the Ed25519 signing
//! key, so the same phrase always yields the same delegate identity.

use crate::{errors::CryptoError, hashing::sha256};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// An Ed25519 keypair held by this node for forging.
pub struct ForgingKeypair {
    signing_key: SigningKey,
}

impl ForgingKeypair {
    /// Derive a keypair from a secret phrase.
    pub fn from_secret(secret: &str) -> Self {
        let seed = sha256(secret.as_bytes());
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// The delegate identity for this keypair.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message hash (deterministic, no RNG).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Verify an Ed25519 signature over `message` for `public_key`.
pub fn verify(
    message: &[u8],
    signature: &[u8; 64],
    public_key: &[u8; 32],
) -> Result<(), CryptoError> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature);
    verifying_key
        .verify(message, &sig)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}
