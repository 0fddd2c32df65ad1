//! # SHA-256 Hashing
//!
//! The single digest used by the consensus core. Round seeds, block ids and
//! transaction ids are all SHA-256 digests; any change here is a hard fork.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
