//! # dc-02-rounds
//!
//! Round accounting subsystem for Delegate-Chain.
//!
//! ## Architecture
//!
//! A round is a window of 101 block slots. This subsystem tracks the
//! in-progress round's fee pool and forger set; on round completion it
//! distributes fees and penalizes absentees, and it supports an exact
//! inverse operation for rollback.
//!
//! Rounds are derived, not stored: a closed round's transient fee pool and
//! forger list are deleted immediately after distribution. Only the effect
//! on delegate state persists.
//!
//! ## Invariants
//!
//! - **Conservation**: for every closed round,
//!   `foundation_fee + Σ(delegate_fee) + leftover == fee_pool`.
//! - **Reversibility**: `tick(block)` followed by
//!   `backward_tick(block, previous)` restores forged/missed counts and fee
//!   pools to their pre-tick values.
//!
//! All mutation happens inside Sequence-ordered callbacks. The read-only
//! `blocks_stat` accessor may be called concurrently and sees a consistent
//! snapshot between sequenced mutations.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use domain::{split_fee_pool, Direction, FeeSplit, RoundError, RoundResult, RoundTask};
pub use ports::{DelegateSchedule, LedgerGateway};
pub use service::{RoundAccountant, RoundStats};
