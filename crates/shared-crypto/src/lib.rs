//! # Shared Crypto Crate
//!
//! Hashing and signature primitives consumed by the consensus core.
//!
//! Only two primitives are in scope: SHA-256 digests (round seeds, block and
//! transaction identifiers) and Ed25519 sign/verify (block generation and
//! slot validation).

pub mod errors;
pub mod hashing;
pub mod signatures;

pub use errors::CryptoError;
pub use hashing::sha256;
pub use signatures::{ForgingKeypair, verify};
