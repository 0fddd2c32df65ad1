//! Driven ports (outbound dependencies) of chain synchronization.

use crate::domain::LoadBlocksFailure;
use async_trait::async_trait;
use dc_02_rounds::Direction;
use shared_types::{
    Block, BlockId, ChainStoreError, ForkEvent, LedgerError, Peer, PublicKey, Transaction,
};

/// Peer network access. Transport timeouts are this port's concern; a
/// cycle that gets no usable data simply ends.
#[async_trait]
pub trait PeerGateway: Send + Sync {
    /// A randomly selected peer and its reported chain height, or `None`
    /// when no peer answered this cycle.
    async fn random_peer_height(&self) -> Option<(Peer, u64)>;

    /// The highest block shared between the local chain and `peer`,
    /// searched downward from `height`.
    async fn get_common_block(&self, peer: Peer, height: u64) -> Option<Block>;

    /// Fetch blocks after `since_block` from `peer` and apply each through
    /// verification and round ticking. Returns the last applied block; on
    /// failure carries the last block that applied cleanly.
    async fn load_blocks_from_peer(
        &self,
        peer: Peer,
        since_block: BlockId,
    ) -> Result<Block, LoadBlocksFailure>;

    /// Ban `peer` for `duration_secs` seconds.
    async fn ban_peer(&self, peer: Peer, duration_secs: u64);

    /// Demote `peer` for `duration_secs` seconds after a failed request.
    /// Softer than a ban; the peer is skipped until the window passes.
    async fn demote_peer(&self, peer: Peer, duration_secs: u64);
}

/// Persisted chain access.
#[async_trait]
pub trait ChainStore: Send + Sync {
    /// The current chain tip.
    fn last_block(&self) -> Block;

    /// The genesis block.
    fn genesis_block(&self) -> Block;

    /// Number of persisted blocks.
    async fn count(&self) -> Result<u64, ChainStoreError>;

    /// Delete every block above `ancestor`, highest first, driving the
    /// backward round tick for each removed block.
    async fn delete_blocks_after(&self, ancestor: &Block) -> Result<(), ChainStoreError>;

    /// Load `limit` persisted blocks starting `offset` blocks from genesis,
    /// applying each through verification and round ticking. Returns the
    /// last applied block.
    async fn load_blocks_offset(
        &self,
        limit: u64,
        offset: u64,
        verify: bool,
    ) -> Result<Block, ChainStoreError>;

    /// Remove persisted blocks above `height` without replaying them. Used
    /// only to clip a chain that failed to decode during bootstrap.
    async fn truncate_above(&self, height: u64) -> Result<(), ChainStoreError>;
}

/// The unconfirmed transaction pool, drained into an overflow workspace
/// before a rollback and re-admitted after replay.
#[async_trait]
pub trait UnconfirmedPool: Send + Sync {
    /// Undo the ledger effects of every unconfirmed transaction and return
    /// them in pool order, leaving the pool empty.
    async fn undo_unconfirmed_list(&self) -> Result<Vec<Transaction>, LedgerError>;

    /// Re-admit a displaced transaction as newly unconfirmed. Processed,
    /// not re-broadcast.
    async fn process_unconfirmed(&self, transaction: Transaction);
}

/// Persisted account-state checks used by chain bootstrap.
#[async_trait]
pub trait LedgerVerifier: Send + Sync {
    /// Whether every account's block linkage matches a persisted block.
    async fn linkage_consistent(&self) -> Result<bool, LedgerError>;

    /// Public keys of all persisted delegate rows.
    async fn delegate_rows(&self) -> Result<Vec<PublicKey>, LedgerError>;

    /// Drop and recreate the derived account tables ahead of a full replay.
    async fn reset_tables(&self) -> Result<(), LedgerError>;
}

/// Append-only forensic log of fork/rollback events.
#[async_trait]
pub trait ForkLog: Send + Sync {
    async fn record(&self, event: ForkEvent);
}

/// Access to the round accountant's direction safety valve.
#[async_trait]
pub trait RoundGateway: Send + Sync {
    async fn direction_swap(&self, direction: Direction);
}

/// Bootstrap seeding of the delegate registry from persisted rows.
pub trait DelegateSeed: Send + Sync {
    fn load_delegates_list(&self, rows: Vec<PublicKey>);
}
