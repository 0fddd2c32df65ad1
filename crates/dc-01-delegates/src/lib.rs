//! # dc-01-delegates
//!
//! Delegate subsystem for Delegate-Chain.
//!
//! ## Architecture
//!
//! This subsystem owns the in-memory delegate registry and everything
//! derived from it:
//!
//! - **Delegate Registry**: public key → vote weight, username, accrued fee.
//! - **Active List Generator**: deterministic `height → ordered delegate ids`,
//!   reproduced bit-for-bit by every node.
//! - **Slot Scheduler**: wall-clock time → slot → scheduled delegate, used
//!   both to decide "is it my turn to forge" and to validate "was this block
//!   forged by the right delegate".
//! - **Forging loop**: a ~1s cadence task that submits block generation
//!   through the consensus `Sequence` when a controlled delegate's slot
//!   arrives.
//!
//! All registry mutation happens inside Sequence-ordered callbacks; the
//! read-only accessors take a consistent snapshot under a `parking_lot`
//! lock.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use domain::{
    generate_active_list, ActiveList, DelegateError, DelegateRegistry, DelegateResult,
    ForgingKeyring, Slots,
};
pub use ports::{BlockForger, LastBlockSource, SyncProbe, SystemTimeSource, TimeSource};
pub use service::{DelegateService, ForgingOpportunity};
