//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors from hashing and signature primitives.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The 32 bytes did not decode to a valid Ed25519 point.
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Signature did not verify against the message and key.
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
}
