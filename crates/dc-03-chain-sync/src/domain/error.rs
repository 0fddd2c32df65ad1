//! Error types for chain synchronization.

use shared_types::{Block, ChainStoreError, LedgerError};

/// Failure while loading replacement blocks from a peer. Carries the last
/// block that applied cleanly, if any, so the synchronizer can recover to
/// the best valid point instead of discarding all progress.
#[derive(Debug)]
pub struct LoadBlocksFailure {
    /// Why the load stopped.
    pub reason: String,
    /// The last block that passed validation and was applied.
    pub last_valid: Option<Block>,
}

/// Chain synchronization error types.
///
/// Peer misbehavior is not represented here: malformed responses and
/// consensus violations are handled in place (logged, peer penalized) and
/// the cycle simply ends. Only failures the engine cannot absorb escape.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Persistence failed while the chain was mid-mutation. The runtime
    /// must halt: local state may be inconsistent with storage.
    #[error("Fatal persistence failure during chain mutation: {0}")]
    Fatal(#[from] ChainStoreError),

    /// The ledger could not undo the unconfirmed transaction pool ahead of
    /// a rollback. Same consequence as a persistence failure.
    #[error("Fatal ledger failure during rollback preparation: {0}")]
    FatalLedger(#[from] LedgerError),
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
