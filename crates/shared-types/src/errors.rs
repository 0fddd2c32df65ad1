//! # Error Types
//!
//! Defines error types shared across subsystems.

use thiserror::Error;

/// Errors surfaced by the ledger store collaborator.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The merge target could not be resolved to an account.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The underlying store rejected the write.
    #[error("Ledger store error: {0}")]
    StoreError(String),
}

/// Errors surfaced by the chain store collaborator.
#[derive(Debug, Clone, Error)]
pub enum ChainStoreError {
    /// Block not found in storage.
    #[error("Block not found: {0}")]
    NotFound(String),

    /// The block failed consensus validation (bad linkage or a generator
    /// that does not match its slot's schedule).
    #[error("Invalid block at height {height}: {reason}")]
    InvalidBlock { height: u64, reason: String },

    /// A persisted block failed to decode. Carries the height of the last
    /// block that decoded cleanly, so bootstrap can truncate there.
    #[error("Block decode failed after height {last_good_height}")]
    DecodeFailed { last_good_height: u64 },

    /// Persistence failure during chain mutation. Fatal to the process: the
    /// engine cannot safely continue with a possibly-inconsistent chain.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}
