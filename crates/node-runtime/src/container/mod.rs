//! # Engine Container
//!
//! Builds the consensus engine: event bus, both sequences, the delegate,
//! round and sync subsystems, and the in-process adapters wiring them
//! together. All components receive explicit references at construction;
//! there are no module-level singletons, so tests can instantiate
//! independent engines.

use crate::adapters::{
    ForgerAdapter, InMemoryChainStore, InMemoryForkLog, InMemoryLedger, InMemoryUnconfirmedPool,
    RegistrySeedAdapter, RoundDirectionAdapter, ScheduleAdapter, StaticPeerGateway,
    SyncProbeAdapter, TipAdapter,
};
use crate::config::NodeConfig;
use crate::genesis::build_genesis;
use anyhow::Context;
use dc_01_delegates::{
    BlockForger, DelegateService, ForgingKeyring, LastBlockSource, Slots, SyncProbe,
    SystemTimeSource, TimeSource,
};
use dc_02_rounds::{DelegateSchedule, LedgerGateway, RoundAccountant};
use dc_03_chain_sync::{
    ChainStore, DelegateSeed, ForkLog, LedgerVerifier, PeerGateway, RoundGateway, SyncResult,
    SyncService, UnconfirmedPool,
};
use shared_bus::{EventPublisher, InMemoryEventBus};
use shared_sequence::{Sequence, SequenceError};
use shared_types::{LedgerError, Transaction};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::info;

/// Handles on the engine's long-running loops.
pub struct EngineHandles {
    /// Exits with `Err` on a fatal persistence failure; the runtime halts.
    pub sync_loop: tokio::task::JoinHandle<SyncResult<()>>,
    pub forging_loop: tokio::task::JoinHandle<()>,
}

/// The assembled consensus engine.
///
/// Must be constructed inside a tokio runtime: the sequences spawn their
/// worker tasks immediately.
pub struct Engine {
    pub config: NodeConfig,
    pub bus: Arc<InMemoryEventBus>,
    /// Consensus-critical task stream: block apply, round ticks, sync steps.
    pub consensus_sequence: Arc<Sequence>,
    /// Balance-affecting API submissions; independent so user-facing work
    /// does not starve sync and forge tasks.
    pub balances_sequence: Arc<Sequence>,
    pub delegates: Arc<DelegateService>,
    pub accountant: Arc<Mutex<RoundAccountant>>,
    pub ledger: Arc<InMemoryLedger>,
    pub chain: Arc<InMemoryChainStore>,
    pub pool: Arc<InMemoryUnconfirmedPool>,
    pub peers: Arc<StaticPeerGateway>,
    pub fork_log: Arc<InMemoryForkLog>,
    pub sync: Arc<SyncService>,
}

impl Engine {
    pub fn new(config: NodeConfig) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let consensus_sequence = Arc::new(Sequence::new("consensus"));
        let balances_sequence = Arc::new(Sequence::new("balances"));

        let mut keyring = ForgingKeyring::new();
        for secret in &config.forging_secrets {
            keyring.add_secret(secret);
        }
        let delegates = Arc::new(DelegateService::new(
            Slots::new(config.genesis_timestamp),
            keyring,
        ));

        let ledger = Arc::new(InMemoryLedger::new());
        let accountant = Arc::new(Mutex::new(RoundAccountant::new(
            Arc::clone(&ledger) as Arc<dyn LedgerGateway>,
            Arc::new(ScheduleAdapter(Arc::clone(&delegates))) as Arc<dyn DelegateSchedule>,
            Arc::clone(&bus) as Arc<dyn EventPublisher>,
        )));

        let genesis = build_genesis(config.genesis_timestamp, &config.genesis_delegate_keys());
        let chain = Arc::new(InMemoryChainStore::new(
            genesis,
            Arc::clone(&accountant),
            Arc::clone(&delegates),
            Arc::clone(&ledger),
            Arc::clone(&bus) as Arc<dyn EventPublisher>,
        ));

        let pool = Arc::new(InMemoryUnconfirmedPool::new(Arc::clone(&ledger)));
        let peers = Arc::new(StaticPeerGateway::new(
            Arc::clone(&chain),
            config.peer_list(),
        ));
        let fork_log = Arc::new(InMemoryForkLog::new());

        let sync = Arc::new(SyncService::new(
            Arc::clone(&peers) as Arc<dyn PeerGateway>,
            Arc::clone(&chain) as Arc<dyn ChainStore>,
            Arc::clone(&pool) as Arc<dyn UnconfirmedPool>,
            Arc::clone(&ledger) as Arc<dyn LedgerVerifier>,
            Arc::clone(&fork_log) as Arc<dyn ForkLog>,
            Arc::new(RoundDirectionAdapter(Arc::clone(&accountant))) as Arc<dyn RoundGateway>,
            Arc::new(RegistrySeedAdapter(Arc::clone(&delegates))) as Arc<dyn DelegateSeed>,
            Arc::clone(&bus) as Arc<dyn EventPublisher>,
        ));

        Self {
            config,
            bus,
            consensus_sequence,
            balances_sequence,
            delegates,
            accountant,
            ledger,
            chain,
            pool,
            peers,
            fork_log,
            sync,
        }
    }

    /// Bootstrap the chain and start the sync and forging loops.
    pub async fn start(&self) -> anyhow::Result<EngineHandles> {
        self.sync
            .load_block_chain(self.config.verify_on_load)
            .await
            .context("chain bootstrap failed")?;

        self.bus.publish(shared_bus::ChainEvent::PeerReady).await;
        info!("Engine started");

        let sync_loop = self
            .sync
            .spawn_sync_loop(Arc::clone(&self.consensus_sequence));

        let forging_loop = Arc::clone(&self.delegates).spawn_forging_loop(
            Arc::clone(&self.consensus_sequence),
            Arc::new(ForgerAdapter::new(
                Arc::clone(&self.chain),
                Arc::clone(&self.pool),
            )) as Arc<dyn BlockForger>,
            Arc::new(TipAdapter(Arc::clone(&self.chain))) as Arc<dyn LastBlockSource>,
            Arc::new(SyncProbeAdapter(Arc::clone(&self.sync))) as Arc<dyn SyncProbe>,
            Arc::new(SystemTimeSource) as Arc<dyn TimeSource>,
        );

        Ok(EngineHandles {
            sync_loop,
            forging_loop,
        })
    }

    /// Submit a transaction through the balances sequence. The returned
    /// receiver resolves once the sequenced admission has run.
    pub fn submit_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<oneshot::Receiver<Result<(), LedgerError>>, SequenceError> {
        let pool = Arc::clone(&self.pool);
        let delegates = Arc::clone(&self.delegates);
        self.balances_sequence.submit(move || async move {
            delegates.on_unconfirmed_transaction(&transaction);
            pool.admit(transaction).await
        })
    }
}
