//! Domain logic for round accounting.

pub mod error;
pub mod fees;

pub use error::{RoundError, RoundResult};
pub use fees::{split_fee_pool, FeeSplit};

use futures::future::BoxFuture;

/// A unit of deferred work registered via `run_on_finish`, executed exactly
/// once at the next round close.
pub type RoundTask = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Accounting direction. The synchronizer flips to `Backward` while
/// removing blocks during a rollback and back to `Forward` before replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Applying blocks to the chain tip.
    Forward,
    /// Removing blocks during rollback.
    Backward,
}
