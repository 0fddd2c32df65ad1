//! # Chain Synchronizer
//!
//! One sync cycle: poll a random peer for its height, and when the peer is
//! ahead either stream the full chain from genesis (local chain still at
//! genesis) or find the common ancestor and reorganize. Rollback depth is
//! bounded at 1010 blocks; deeper divergence bans the peer and leaves the
//! local chain untouched.
//!
//! Every cycle runs as one task on the consensus `Sequence`, so rollback
//! and replay never interleave with block application or forging.

use crate::domain::{SyncError, SyncResult, LOAD_PER_ITERATION};
use crate::ports::{
    ChainStore, DelegateSeed, ForkLog, LedgerVerifier, PeerGateway, RoundGateway, UnconfirmedPool,
};
use dc_02_rounds::Direction;
use parking_lot::RwLock;
use shared_bus::{ChainEvent, EventPublisher};
use shared_sequence::Sequence;
use shared_types::{
    Block, ForkCause, ForkEvent, Peer, SyncStatus, Transaction, LONG_FORK_BAN_SECS,
    MAX_ROLLBACK_DEPTH, PEER_DEMOTE_SECS, SYNC_INTERVAL_SECS,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct SyncState {
    loaded: bool,
    syncing: bool,
    blocks_to_sync: u64,
    total: u64,
    loading_last_height: u64,
}

/// The chain synchronization service.
pub struct SyncService {
    state: RwLock<SyncState>,
    peers: Arc<dyn PeerGateway>,
    chain: Arc<dyn ChainStore>,
    unconfirmed: Arc<dyn UnconfirmedPool>,
    verifier: Arc<dyn LedgerVerifier>,
    fork_log: Arc<dyn ForkLog>,
    rounds: Arc<dyn RoundGateway>,
    delegates: Arc<dyn DelegateSeed>,
    bus: Arc<dyn EventPublisher>,
}

impl SyncService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        peers: Arc<dyn PeerGateway>,
        chain: Arc<dyn ChainStore>,
        unconfirmed: Arc<dyn UnconfirmedPool>,
        verifier: Arc<dyn LedgerVerifier>,
        fork_log: Arc<dyn ForkLog>,
        rounds: Arc<dyn RoundGateway>,
        delegates: Arc<dyn DelegateSeed>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            state: RwLock::new(SyncState::default()),
            peers,
            chain,
            unconfirmed,
            verifier,
            fork_log,
            rounds,
            delegates,
            bus,
        }
    }

    /// Whether a sync cycle is currently running. Forging is suppressed
    /// while this is true.
    pub fn syncing(&self) -> bool {
        self.state.read().syncing
    }

    /// Sync progress for operators and telemetry collaborators.
    pub fn status(&self) -> SyncStatus {
        let state = self.state.read();
        SyncStatus {
            loaded: state.loaded,
            blocks_count: state.total,
            syncing: state.syncing,
            blocks_remaining: state.blocks_to_sync,
            height: self.chain.last_block().height,
        }
    }

    /// One sync cycle: poll a random peer and reconcile if it is ahead.
    pub async fn sync_cycle(&self) -> SyncResult<()> {
        let Some((peer, peer_height)) = self.peers.random_peer_height().await else {
            // No usable peer data this cycle; the loop retries on cadence.
            return Ok(());
        };

        let last_block = self.chain.last_block();
        debug!(%peer, peer_height, local_height = last_block.height, "Checked peer chain");

        if peer_height <= last_block.height {
            return Ok(());
        }
        self.state.write().blocks_to_sync = peer_height;

        if last_block.id == self.chain.genesis_block().id {
            self.load_full_chain(peer).await
        } else {
            self.find_update(&last_block, peer).await
        }
    }

    /// Stream the whole chain from genesis. Only valid while the local
    /// chain has no blocks past genesis, so there is nothing to roll back.
    async fn load_full_chain(&self, peer: Peer) -> SyncResult<()> {
        let genesis_id = self.chain.genesis_block().id;
        debug!(%peer, "Loading blocks from genesis");

        if let Err(failure) = self.peers.load_blocks_from_peer(peer, genesis_id).await {
            warn!(%peer, reason = %failure.reason, "Full chain load failed, demoting peer");
            self.peers.demote_peer(peer, PEER_DEMOTE_SECS).await;
        }
        Ok(())
    }

    /// Common-ancestor reorganization against `peer`.
    async fn find_update(&self, last_block: &Block, peer: Peer) -> SyncResult<()> {
        info!(%peer, "Looking for common block");
        let Some(common) = self.peers.get_common_block(peer, last_block.height).await else {
            return Ok(());
        };
        info!(
            %peer,
            common_height = common.height,
            "Found common block"
        );

        let to_remove = last_block.height - common.height;
        if to_remove > MAX_ROLLBACK_DEPTH {
            warn!(%peer, depth = to_remove, "Long fork, banning peer");
            self.fork_log
                .record(fork_event(last_block, ForkCause::LongFork))
                .await;
            self.peers.ban_peer(peer, LONG_FORK_BAN_SECS).await;
            return Ok(());
        }

        if to_remove > 0 {
            self.fork_log
                .record(fork_event(last_block, ForkCause::CommonAncestorMismatch))
                .await;
        }

        // Displace unconfirmed transactions before touching the chain. A
        // failure here is as fatal as a persistence failure: the ledger may
        // already be partially unwound.
        let overflow = self.unconfirmed.undo_unconfirmed_list().await?;

        self.rollback_to(&common, last_block).await?;

        match self
            .peers
            .load_blocks_from_peer(peer, common.id)
            .await
        {
            Ok(applied_tip) => {
                debug!(height = applied_tip.height, "Replacement blocks applied");
                self.readmit(overflow).await;
                Ok(())
            }
            Err(failure) => {
                error!(%peer, reason = %failure.reason, "Can't load blocks, banning peer");
                self.fork_log
                    .record(fork_event(last_block, ForkCause::InvalidReplacement))
                    .await;
                self.peers.ban_peer(peer, LONG_FORK_BAN_SECS).await;

                // Recover to the best valid block actually received: keep
                // the partial upload when it reaches further than what was
                // removed, otherwise fall back to the common ancestor.
                if let Some(last_valid) = failure.last_valid {
                    let uploaded = last_valid.height - common.height;
                    if to_remove < uploaded {
                        info!(
                            height = last_valid.height,
                            "Removing blocks again until last valid block"
                        );
                        self.rollback_to(&last_valid, last_block).await?;
                    } else {
                        info!(
                            height = common.height,
                            "Removing blocks again until common block"
                        );
                        self.rollback_to(&common, last_block).await?;
                    }
                }
                self.readmit(overflow).await;
                Ok(())
            }
        }
    }

    /// Delete blocks above `ancestor`, flipping the round accountant into
    /// backward mode around the deletion. The direction flip is skipped
    /// when `ancestor` already is the tip, since nothing will be removed.
    async fn rollback_to(&self, ancestor: &Block, tip: &Block) -> SyncResult<()> {
        let swap = ancestor.id != tip.id;
        if swap {
            self.rounds.direction_swap(Direction::Backward).await;
        }
        let deleted = self.chain.delete_blocks_after(ancestor).await;
        if swap {
            self.rounds.direction_swap(Direction::Forward).await;
        }
        deleted?;
        Ok(())
    }

    /// Re-admit displaced transactions in original pool order.
    async fn readmit(&self, overflow: Vec<Transaction>) {
        for transaction in overflow {
            self.unconfirmed.process_unconfirmed(transaction).await;
        }
    }

    /// Run the sync loop on a 9s cadence, one sequenced cycle at a time.
    ///
    /// Returns when a fatal error escapes a cycle; the runtime awaits the
    /// handle and halts on `Err`.
    pub fn spawn_sync_loop(self: &Arc<Self>, sequence: Arc<Sequence>) -> JoinHandle<SyncResult<()>> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(SYNC_INTERVAL_SECS));
            loop {
                interval.tick().await;

                service.state.write().syncing = true;
                let cycle_service = Arc::clone(&service);
                let submitted =
                    sequence.submit(move || async move { cycle_service.sync_cycle().await });
                let outcome = match submitted {
                    Ok(receiver) => receiver.await.unwrap_or(Ok(())),
                    Err(e) => {
                        // Sequence shut down; the node is stopping.
                        debug!(error = %e, "Sync loop stopping");
                        return Ok(());
                    }
                };
                {
                    let mut state = service.state.write();
                    state.syncing = false;
                    state.blocks_to_sync = 0;
                }

                if let Err(e) = outcome {
                    error!(error = %e, "Fatal sync failure, halting");
                    return Err(e);
                }
            }
        })
    }

    /// Chain bootstrap: verify persisted state and either fast-load the tip
    /// or rebuild account state by replaying the whole chain.
    pub async fn load_block_chain(&self, verify_on_load: bool) -> SyncResult<()> {
        let count = self.chain.count().await?;
        info!(blocks = count, "Loading blockchain");

        if !verify_on_load && count > 1 {
            match self.try_fast_load(count).await {
                Ok(()) => {
                    self.finish_bootstrap(count).await;
                    return Ok(());
                }
                Err(reason) => {
                    info!(reason, "Can't load without verifying, rebuilding from genesis");
                }
            }
        }

        self.rebuild(count).await?;
        self.finish_bootstrap(count).await;
        Ok(())
    }

    /// Fast path: trust persisted account state, seed the delegate registry
    /// from persisted rows and replay only the tip block. Any inconsistency
    /// falls back to a full rebuild with the reason it was rejected.
    async fn try_fast_load(&self, count: u64) -> Result<(), &'static str> {
        let consistent = self
            .verifier
            .linkage_consistent()
            .await
            .map_err(|_| "linkage check failed")?;
        if !consistent {
            return Err("missed block linkage found");
        }

        let rows = self
            .verifier
            .delegate_rows()
            .await
            .map_err(|_| "delegate rows unavailable")?;
        if rows.is_empty() {
            return Err("no delegates");
        }
        self.delegates.load_delegates_list(rows);

        let tip = self
            .chain
            .load_blocks_offset(1, count.saturating_sub(1), true)
            .await
            .map_err(|_| "can't load last block")?;
        self.state.write().loading_last_height = tip.height;
        Ok(())
    }

    /// Full replay: reset derived account tables and re-apply every block
    /// from height 1 with verification and round ticking. A decode failure
    /// truncates the chain at the last good block instead of failing the
    /// bootstrap.
    async fn rebuild(&self, count: u64) -> SyncResult<()> {
        self.verifier.reset_tables().await?;

        let mut offset = 0u64;
        while offset < count {
            info!(current = offset, "Replaying blocks");
            match self
                .chain
                .load_blocks_offset(LOAD_PER_ITERATION, offset, true)
                .await
            {
                Ok(last) => {
                    self.state.write().loading_last_height = last.height;
                    offset += LOAD_PER_ITERATION;
                }
                Err(shared_types::ChainStoreError::DecodeFailed { last_good_height }) => {
                    error!(last_good_height, "Blockchain failed to decode, clipping");
                    self.chain.truncate_above(last_good_height).await?;
                    self.state.write().loading_last_height = last_good_height;
                    break;
                }
                Err(e) => return Err(SyncError::Fatal(e)),
            }
        }
        Ok(())
    }

    async fn finish_bootstrap(&self, count: u64) {
        {
            let mut state = self.state.write();
            state.loaded = true;
            state.total = count;
        }
        info!("Blockchain ready");
        self.bus.publish(ChainEvent::BlockchainReady).await;
    }
}

fn fork_event(block: &Block, cause: ForkCause) -> ForkEvent {
    ForkEvent {
        generator_public_key: block.generator_public_key,
        block_timestamp: block.timestamp,
        block_id: block.id,
        block_height: block.height,
        previous_block: block.previous_block,
        cause,
    }
}
