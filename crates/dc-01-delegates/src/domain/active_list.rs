//! # Active List Generator
//!
//! Pure function `height → ordered list of delegate ids`, deterministic and
//! reproducible by any node with an identical registry.
//!
//! ## Algorithm
//!
//! 1. Sort all delegates descending by vote weight, ties ascending by
//!    public key (a total order).
//! 2. Truncate to the first `SLOTS_PER_ROUND` entries.
//! 3. Seed `seed0 = SHA256(round_number.to_string())`.
//! 4. Walk index `i` from 0 upward. For up to 4 sub-steps per outer
//!    iteration, consume one seed byte `seed[x]`, swap positions `i` and
//!    `seed[x] % len`, and advance `i`. After each group of up to 4 swaps,
//!    re-derive `seed = SHA256(seed)`.
//!
//! This is a biased positional shuffle, not a uniform permutation. Early
//! indices are swapped disproportionately often. Consensus requires
//! bit-for-bit matching behavior across nodes, so the byte-consumption
//! order above is load-bearing: do not replace it with Fisher–Yates.
//! Changing the shuffle is a protocol upgrade, not a bug fix.

use shared_crypto::sha256;
use shared_types::{PublicKey, SLOTS_PER_ROUND};

/// One round's slot-ordered delegate ids. Valid only for the round it was
/// generated for; never cached across rounds because vote weights change.
pub type ActiveList = Vec<PublicKey>;

/// Apply the seeded swap pass for `round` over vote-sorted delegate keys.
///
/// Always returns a list, possibly shorter than `SLOTS_PER_ROUND` when
/// fewer delegates exist; callers must tolerate a short list.
pub fn generate_active_list(round: u64, mut keys: Vec<PublicKey>) -> ActiveList {
    keys.truncate(SLOTS_PER_ROUND);
    let len = keys.len();
    if len == 0 {
        return keys;
    }

    let mut seed = sha256(round.to_string().as_bytes());
    let mut i = 0;
    while i < len {
        for x in 0..4 {
            if i >= len {
                break;
            }
            let j = seed[x] as usize % len;
            keys.swap(i, j);
            i += 1;
        }
        seed = sha256(&seed);
    }
    keys
}
