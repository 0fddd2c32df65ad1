//! Error types for round accounting.

use shared_types::{LedgerError, PublicKey};

/// Round accounting error types.
///
/// Every variant carries full context (round number, delegate, fee pool):
/// silent loss of a conservation invariant is worse than stopping.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    #[error("Foundation fee merge failed for round {round} (pool {fee_pool}): {source}")]
    FoundationMerge {
        round: u64,
        fee_pool: u64,
        source: LedgerError,
    },

    #[error("Delegate fee merge failed for round {round}, delegate {delegate:?} (pool {fee_pool}): {source}")]
    DelegateMerge {
        round: u64,
        delegate: PublicKey,
        fee_pool: u64,
        source: LedgerError,
    },
}

/// Result type for round operations.
pub type RoundResult<T> = Result<T, RoundError>;
