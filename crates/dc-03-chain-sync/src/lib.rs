//! # dc-03-chain-sync
//!
//! Chain synchronization subsystem for Delegate-Chain.
//!
//! ## Architecture
//!
//! Drives peer polling, common-ancestor discovery, and bounded chain
//! rollback/replay when a longer valid fork is found:
//!
//! - **Sync loop**: a 9s cadence task that asks a random peer for its
//!   height and, when the peer is ahead, runs one sync cycle through the
//!   consensus `Sequence`.
//! - **Fork resolution**: common-ancestor search bounded by the 1010-block
//!   rollback limit; deeper divergence bans the peer instead of rolling
//!   back.
//! - **Chain bootstrap**: startup verification of persisted account/block
//!   linkage, with a full replay from genesis when the persisted state
//!   cannot be trusted.
//!
//! Rollback and replay mutate consensus state, so every cycle runs as one
//! sequenced task. Persistence failures mid-rollback are fatal: the engine
//! halts rather than continue on a possibly-inconsistent chain.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use domain::{LoadBlocksFailure, SyncError, SyncResult};
pub use ports::{
    ChainStore, DelegateSeed, ForkLog, LedgerVerifier, PeerGateway, RoundGateway, UnconfirmedPool,
};
pub use service::SyncService;
