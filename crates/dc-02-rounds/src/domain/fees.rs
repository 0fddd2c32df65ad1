//! # Fee Pool Arithmetic
//!
//! Integer split of a round's fee pool. The foundation takes one tenth
//! (floored); the remainder is divided evenly among the round's forgers
//! (floored), and the indivisible leftover is credited to exactly one
//! forger so the pool is conserved to the base unit.

/// The exact split of one round's fee pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    /// `floor(pool / 10)`, credited to the foundation address.
    pub foundation_fee: u64,
    /// `floor((pool - foundation_fee) / forger_count)`, credited per forger.
    pub delegates_fee: u64,
    /// The remainder, credited to exactly one forger. Always `< forger_count`.
    pub leftover: u64,
}

/// Split `fee_pool` across `forger_count` forgers.
///
/// Conservation: `foundation_fee + delegates_fee * forger_count + leftover
/// == fee_pool` for every `forger_count >= 1`.
pub fn split_fee_pool(fee_pool: u64, forger_count: u64) -> FeeSplit {
    let foundation_fee = fee_pool / 10;
    let diff_fee = fee_pool - foundation_fee;
    if forger_count == 0 {
        // No forgers means no blocks, so the pool is necessarily empty.
        return FeeSplit {
            foundation_fee,
            delegates_fee: 0,
            leftover: diff_fee,
        };
    }
    let delegates_fee = diff_fee / forger_count;
    FeeSplit {
        foundation_fee,
        delegates_fee,
        leftover: diff_fee - delegates_fee * forger_count,
    }
}
