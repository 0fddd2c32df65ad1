//! # In-Memory Chain Store
//!
//! Holds the block chain and drives the consensus side effects of every
//! chain mutation: slot validation, registry absorption, ledger linkage and
//! round ticking forward, backward ticking on deletion.
//!
//! All mutation entry points run inside Sequence-ordered callbacks; the
//! block vector lock is held only for short reads and writes, never across
//! an await.

use super::ledger::InMemoryLedger;
use async_trait::async_trait;
use dc_01_delegates::DelegateService;
use dc_02_rounds::RoundAccountant;
use dc_03_chain_sync::ChainStore;
use parking_lot::RwLock;
use shared_bus::{ChainEvent, EventPublisher};
use shared_types::{Block, BlockId, ChainStoreError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// In-process chain store.
pub struct InMemoryChainStore {
    genesis: Block,
    blocks: RwLock<Vec<Block>>,
    accountant: Arc<Mutex<RoundAccountant>>,
    delegates: Arc<DelegateService>,
    ledger: Arc<InMemoryLedger>,
    bus: Arc<dyn EventPublisher>,
}

impl InMemoryChainStore {
    /// Create a store holding only the genesis block. Genesis is persisted
    /// un-ticked; bootstrap replay applies its consensus side effects.
    pub fn new(
        genesis: Block,
        accountant: Arc<Mutex<RoundAccountant>>,
        delegates: Arc<DelegateService>,
        ledger: Arc<InMemoryLedger>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            blocks: RwLock::new(vec![genesis.clone()]),
            genesis,
            accountant,
            delegates,
            ledger,
            bus,
        }
    }

    /// Whether `id` is a block of the local chain.
    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.read().iter().any(|b| b.id == *id)
    }

    /// Local block by id.
    pub fn block_by_id(&self, id: &BlockId) -> Option<Block> {
        self.blocks.read().iter().find(|b| b.id == *id).cloned()
    }

    /// Append a new block to the tip, applying all consensus side effects.
    pub async fn apply_block(&self, block: Block) -> Result<(), ChainStoreError> {
        let tip = self.last_block();
        if block.height != tip.height + 1 || block.previous_block != Some(tip.id) {
            return Err(ChainStoreError::InvalidBlock {
                height: block.height,
                reason: "does not extend the chain tip".into(),
            });
        }
        self.check_slot(&block)?;

        self.blocks.write().push(block.clone());
        self.absorb(&block).await?;
        debug!(height = block.height, "Block applied");
        self.bus.publish(ChainEvent::BlockApplied { block }).await;
        Ok(())
    }

    fn check_slot(&self, block: &Block) -> Result<(), ChainStoreError> {
        // Genesis precedes delegate registration and has no schedule.
        if block.height == 1 {
            return Ok(());
        }
        if !self.delegates.validate_block_slot(block) {
            return Err(ChainStoreError::InvalidBlock {
                height: block.height,
                reason: "generator does not match the slot schedule".into(),
            });
        }
        Ok(())
    }

    /// The consensus side effects of one applied block.
    async fn absorb(&self, block: &Block) -> Result<(), ChainStoreError> {
        self.delegates.on_block_applied(block);
        for transaction in &block.transactions {
            if transaction.delegate.is_some() {
                self.ledger.mark_delegate(transaction.sender_public_key);
            }
        }
        self.ledger.link_accounts(block.id);

        let mut accountant = self.accountant.lock().await;
        accountant
            .tick(block)
            .await
            .map_err(|e| ChainStoreError::PersistenceFailure(e.to_string()))
    }
}

#[async_trait]
impl ChainStore for InMemoryChainStore {
    fn last_block(&self) -> Block {
        self.blocks
            .read()
            .last()
            .cloned()
            .unwrap_or_else(|| self.genesis.clone())
    }

    fn genesis_block(&self) -> Block {
        self.genesis.clone()
    }

    async fn count(&self) -> Result<u64, ChainStoreError> {
        Ok(self.blocks.read().len() as u64)
    }

    async fn delete_blocks_after(&self, ancestor: &Block) -> Result<(), ChainStoreError> {
        let mut accountant = self.accountant.lock().await;
        loop {
            let (removed, previous) = {
                let mut blocks = self.blocks.write();
                let Some(tip) = blocks.last().cloned() else {
                    break;
                };
                if tip.height <= ancestor.height {
                    break;
                }
                blocks.pop();
                let previous = blocks
                    .last()
                    .cloned()
                    .unwrap_or_else(|| self.genesis.clone());
                (tip, previous)
            };
            info!(height = removed.height, "Block removed");
            accountant
                .backward_tick(&removed, &previous)
                .await
                .map_err(|e| ChainStoreError::PersistenceFailure(e.to_string()))?;
        }
        Ok(())
    }

    async fn load_blocks_offset(
        &self,
        limit: u64,
        offset: u64,
        verify: bool,
    ) -> Result<Block, ChainStoreError> {
        let batch: Vec<Block> = {
            let blocks = self.blocks.read();
            blocks
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect()
        };

        let mut last = self.last_block();
        for block in batch {
            if verify && block.height > 1 && !self.delegates.validate_block_slot(&block) {
                // The stored chain is broken past this point; the caller
                // clips at the last block that replayed cleanly.
                return Err(ChainStoreError::DecodeFailed {
                    last_good_height: block.height.saturating_sub(1),
                });
            }
            self.absorb(&block).await?;
            last = block;
        }
        Ok(last)
    }

    async fn truncate_above(&self, height: u64) -> Result<(), ChainStoreError> {
        self.blocks.write().retain(|b| b.height <= height);
        Ok(())
    }
}
