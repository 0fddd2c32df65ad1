//! Driven ports (outbound dependencies) of the delegate subsystem.

use crate::domain::DelegateResult;
use async_trait::async_trait;
use shared_types::{Block, PublicKey};

/// Block assembly and submission. The forging loop resolves *who* forges
/// *when*; assembling, signing and broadcasting the block is the block
/// subsystem's concern behind this port.
#[async_trait]
pub trait BlockForger: Send + Sync {
    /// Generate, sign and apply a block for `generator` at `timestamp`.
    ///
    /// Called exclusively from inside the consensus `Sequence`.
    async fn generate_block(&self, generator: PublicKey, timestamp: u64) -> DelegateResult<()>;
}

/// Read access to the current chain tip.
pub trait LastBlockSource: Send + Sync {
    /// The most recently applied block.
    fn last_block(&self) -> Block;
}

/// Whether the node is currently synchronizing with a peer. Forging is
/// suppressed during sync.
pub trait SyncProbe: Send + Sync {
    fn syncing(&self) -> bool;
}

/// Time source for the forging loop.
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in seconds.
    fn now(&self) -> u64;
}

/// Default time source using system time.
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
