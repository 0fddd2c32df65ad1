//! # Chain Constants
//!
//! Consensus-critical constants. Every independently-running node must agree
//! on these values bit-for-bit; changing any of them is a protocol upgrade.

/// Number of block slots per round. One round closes once every active
/// delegate has forged or been marked missing.
pub const SLOTS_PER_ROUND: usize = 101;

/// Fixed duration of a forging slot, in seconds.
pub const SLOT_DURATION_SECS: u64 = 10;

/// Maximum depth of a chain reorganization. A peer whose common ancestor is
/// deeper than this is banned instead of followed.
pub const MAX_ROLLBACK_DEPTH: u64 = 1010;

/// Ban duration applied to a peer that offers a fork deeper than
/// [`MAX_ROLLBACK_DEPTH`] or fails to deliver replacement blocks.
pub const LONG_FORK_BAN_SECS: u64 = 3600;

/// Demotion applied to a peer whose request timed out or returned a
/// malformed response. Not a ban: the sync loop simply retries elsewhere.
pub const PEER_DEMOTE_SECS: u64 = 60;

/// Timeout on every outbound peer request, in seconds.
pub const PEER_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Cadence of the block-sync loop, in seconds.
pub const SYNC_INTERVAL_SECS: u64 = 9;

/// Cadence of the forging loop, in seconds.
pub const FORGE_INTERVAL_SECS: u64 = 1;

/// Address credited with the foundation share (one tenth) of every round's
/// fee pool. Address semantics are owned by the ledger store.
pub const FOUNDATION_ADDRESS: &str = "1085993630748340485C";

/// The round a block height belongs to. Round 1 covers heights 1..=101.
pub fn round_for(height: u64) -> u64 {
    let slots = SLOTS_PER_ROUND as u64;
    height / slots + u64::from(height % slots > 0)
}
