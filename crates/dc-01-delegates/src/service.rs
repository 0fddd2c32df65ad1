//! # Delegate Service
//!
//! Orchestrates the registry, the active-list generator and the slot
//! scheduler, and runs the forging loop.

use crate::domain::{
    generate_active_list, ActiveList, DelegateRegistry, ForgingKeyring, Slots,
};
use crate::ports::{BlockForger, LastBlockSource, SyncProbe, TimeSource};
use parking_lot::RwLock;
use shared_sequence::Sequence;
use shared_types::{round_for, Block, PublicKey, Transaction, FORGE_INTERVAL_SECS};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A slot this node can forge in, with its target wall-clock second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForgingOpportunity {
    /// The eligible slot.
    pub slot: u64,
    /// The second at which the slot opens.
    pub timestamp: u64,
    /// The controlled delegate scheduled for the slot.
    pub delegate: PublicKey,
}

/// The delegate subsystem service.
pub struct DelegateService {
    registry: Arc<RwLock<DelegateRegistry>>,
    keyring: ForgingKeyring,
    slots: Slots,
}

impl DelegateService {
    pub fn new(slots: Slots, keyring: ForgingKeyring) -> Self {
        Self {
            registry: Arc::new(RwLock::new(DelegateRegistry::new())),
            keyring,
            slots,
        }
    }

    /// Shared handle to the registry, for bootstrap seeding and fee
    /// accounting adapters.
    pub fn registry(&self) -> Arc<RwLock<DelegateRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Slot arithmetic for this chain.
    pub fn slots(&self) -> Slots {
        self.slots
    }

    /// Deterministic active list for the round containing `height`.
    ///
    /// Recomputed per call from current vote weights; never cached across
    /// rounds.
    pub fn generate_delegate_list(&self, height: u64) -> ActiveList {
        let sorted = self.registry.read().keys_sorted_by_vote();
        generate_active_list(round_for(height), sorted)
    }

    /// The delegate scheduled for `slot` in the round containing `height`.
    pub fn scheduled_delegate(&self, slot: u64, height: u64) -> Option<PublicKey> {
        let list = self.generate_delegate_list(height);
        list.get(self.slots.slot_index(slot)).copied()
    }

    /// Consensus-safety check: true iff the block's generator matches the
    /// delegate its slot schedules. Callers must reject blocks that fail.
    pub fn validate_block_slot(&self, block: &Block) -> bool {
        let slot = self.slots.slot_number(block.timestamp);
        match self.scheduled_delegate(slot, block.height) {
            Some(expected) => expected == block.generator_public_key,
            None => false,
        }
    }

    /// First slot in the current round window, at or after `current_slot`,
    /// scheduled for a delegate this node holds a keypair for.
    pub fn find_forging_opportunity(
        &self,
        current_slot: u64,
        height: u64,
    ) -> Option<ForgingOpportunity> {
        let list = self.generate_delegate_list(height);
        if list.is_empty() {
            return None;
        }
        let last_slot = self.slots.last_slot_of_round(current_slot);
        for slot in current_slot..last_slot {
            if let Some(delegate) = list.get(self.slots.slot_index(slot)) {
                if self.keyring.contains(delegate) {
                    return Some(ForgingOpportunity {
                        slot,
                        timestamp: self.slots.slot_time(slot),
                        delegate: *delegate,
                    });
                }
            }
        }
        None
    }

    /// Whether this node holds a forging keypair for `public_key`.
    pub fn forging_enabled(&self, public_key: &PublicKey) -> bool {
        self.keyring.contains(public_key)
    }

    /// Notification handler: absorb delegate registrations from an applied
    /// block. Runs inside a Sequence-ordered callback.
    pub fn on_block_applied(&self, block: &Block) {
        self.registry.write().absorb_block(block);
    }

    /// Notification handler: track a registration from an unconfirmed
    /// transaction.
    pub fn on_unconfirmed_transaction(&self, transaction: &Transaction) {
        self.registry.write().absorb_unconfirmed_transaction(transaction);
    }

    /// Spawn the forging loop.
    ///
    /// Every second: skip when this node has no forging keys, while
    /// syncing, or when the chain tip already sits in the current slot;
    /// otherwise locate the next opportunity and, exactly when its target
    /// second arrives, submit block generation through the consensus
    /// `Sequence`.
    pub fn spawn_forging_loop(
        self: Arc<Self>,
        sequence: Arc<Sequence>,
        forger: Arc<dyn BlockForger>,
        tip: Arc<dyn LastBlockSource>,
        sync: Arc<dyn SyncProbe>,
        time: Arc<dyn TimeSource>,
    ) -> tokio::task::JoinHandle<()> {
        info!(keys = !self.keyring.is_empty(), "Starting forging loop");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(FORGE_INTERVAL_SECS));
            loop {
                interval.tick().await;

                if self.keyring.is_empty() || sync.syncing() {
                    continue;
                }

                let now = time.now();
                let last_block = tip.last_block();
                let current_slot = self.slots.slot_number(now);

                // Already produced a block in this slot.
                if current_slot == self.slots.slot_number(last_block.timestamp) {
                    continue;
                }

                let Some(opportunity) =
                    self.find_forging_opportunity(current_slot, last_block.height + 1)
                else {
                    continue;
                };

                if opportunity.timestamp != now {
                    continue;
                }

                debug!(
                    slot = opportunity.slot,
                    height = last_block.height + 1,
                    "Forging slot reached"
                );

                let forger = Arc::clone(&forger);
                let delegate = opportunity.delegate;
                let timestamp = opportunity.timestamp;
                let enqueued = sequence.add(move || async move {
                    if let Err(e) = forger.generate_block(delegate, timestamp).await {
                        warn!(error = %e, "Block generation failed");
                    }
                });
                if enqueued.is_err() {
                    // Sequence shut down; the node is stopping.
                    return;
                }
            }
        })
    }
}
