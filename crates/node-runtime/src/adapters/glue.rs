//! # Port Glue
//!
//! Thin adapters connecting one subsystem's driven port to another
//! subsystem's service. Wiring only; no behavior of their own.

use super::chain_store::InMemoryChainStore;
use super::unconfirmed::InMemoryUnconfirmedPool;
use async_trait::async_trait;
use dc_01_delegates::{
    BlockForger, DelegateError, DelegateResult, DelegateService, LastBlockSource, SyncProbe,
};
use dc_02_rounds::{DelegateSchedule, Direction, RoundAccountant};
use dc_03_chain_sync::{DelegateSeed, RoundGateway, SyncService};
use shared_crypto::sha256;
use shared_types::{Block, PublicKey};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Round accounting's view of the delegate subsystem.
pub struct ScheduleAdapter(pub Arc<DelegateService>);

impl DelegateSchedule for ScheduleAdapter {
    fn generate_delegate_list(&self, height: u64) -> Vec<PublicKey> {
        self.0.generate_delegate_list(height)
    }

    fn add_fee(&self, public_key: &PublicKey, amount: i64) {
        self.0.registry().write().add_fee(public_key, amount);
    }
}

/// The synchronizer's handle on the round accountant's direction valve.
pub struct RoundDirectionAdapter(pub Arc<Mutex<RoundAccountant>>);

#[async_trait]
impl RoundGateway for RoundDirectionAdapter {
    async fn direction_swap(&self, direction: Direction) {
        self.0.lock().await.direction_swap(direction);
    }
}

/// Bootstrap seeding of the delegate registry.
pub struct RegistrySeedAdapter(pub Arc<DelegateService>);

impl DelegateSeed for RegistrySeedAdapter {
    fn load_delegates_list(&self, rows: Vec<PublicKey>) {
        self.0.registry().write().load_delegates_list(&rows);
    }
}

/// The forging loop's view of sync progress.
pub struct SyncProbeAdapter(pub Arc<SyncService>);

impl SyncProbe for SyncProbeAdapter {
    fn syncing(&self) -> bool {
        self.0.syncing()
    }
}

/// The forging loop's view of the chain tip.
pub struct TipAdapter(pub Arc<InMemoryChainStore>);

impl LastBlockSource for TipAdapter {
    fn last_block(&self) -> Block {
        use dc_03_chain_sync::ChainStore;
        self.0.last_block()
    }
}

/// Block assembly for the forging loop: drains the unconfirmed pool into a
/// new block over the current tip and applies it.
pub struct ForgerAdapter {
    chain: Arc<InMemoryChainStore>,
    pool: Arc<InMemoryUnconfirmedPool>,
}

impl ForgerAdapter {
    pub fn new(chain: Arc<InMemoryChainStore>, pool: Arc<InMemoryUnconfirmedPool>) -> Self {
        Self { chain, pool }
    }
}

#[async_trait]
impl BlockForger for ForgerAdapter {
    async fn generate_block(&self, generator: PublicKey, timestamp: u64) -> DelegateResult<()> {
        use dc_03_chain_sync::ChainStore;

        let tip = self.chain.last_block();
        let transactions = self.pool.take_all();
        let total_fee = transactions.iter().map(|t| t.fee).sum();

        let mut payload = Vec::new();
        payload.extend_from_slice(&tip.id);
        payload.extend_from_slice(&(tip.height + 1).to_be_bytes());
        payload.extend_from_slice(&timestamp.to_be_bytes());
        payload.extend_from_slice(&generator);
        for transaction in &transactions {
            payload.extend_from_slice(&transaction.id);
        }

        let block = Block {
            id: sha256(&payload),
            height: tip.height + 1,
            timestamp,
            previous_block: Some(tip.id),
            generator_public_key: generator,
            total_fee,
            transactions,
        };

        self.chain
            .apply_block(block)
            .await
            .map_err(|e| DelegateError::ForgeFailed(e.to_string()))
    }
}
