//! Domain types for chain synchronization.

pub mod error;

pub use error::{LoadBlocksFailure, SyncError, SyncResult};

/// Blocks replayed per bootstrap iteration.
pub const LOAD_PER_ITERATION: u64 = 1000;
