//! # Engine Flow Tests
//!
//! Full-engine scenarios: bootstrap, forging over the unconfirmed pool,
//! and fork resolution through the in-process peer gateway, including the
//! rollback depth bound.

#[cfg(test)]
mod tests {
    use dc_01_delegates::BlockForger;
    use dc_03_chain_sync::ChainStore;
    use node_runtime::adapters::ForgerAdapter;
    use node_runtime::{Engine, NodeConfig};
    use node_runtime::config::GenesisDelegate;
    use shared_bus::ChainEvent;
    use shared_crypto::sha256;
    use shared_types::{Block, ForkCause, Peer, Transaction};
    use std::sync::Arc;

    fn engine_config() -> NodeConfig {
        NodeConfig {
            genesis_timestamp: 0,
            genesis_delegates: (1..=101u8)
                .map(|i| GenesisDelegate {
                    username: format!("delegate_{i}"),
                    public_key: format!("{i:02x}").repeat(32),
                })
                .collect(),
            peers: Vec::new(),
            forging_secrets: Vec::new(),
            verify_on_load: false,
            log_filter: "warn".into(),
        }
    }

    async fn booted_engine() -> Engine {
        let engine = Engine::new(engine_config());
        engine.sync.load_block_chain(false).await.unwrap();
        engine
    }

    fn peer() -> Peer {
        Peer {
            ip: u32::from_be_bytes([10, 0, 0, 9]),
            port: 7000,
        }
    }

    /// Build a chain from genesis up to `to_height`, every block forged by
    /// the delegate its slot schedules. `tag` differentiates fork ids.
    fn build_fork(engine: &Engine, to_height: u64, tag: u8) -> Vec<Block> {
        let mut chain = vec![engine.chain.genesis_block()];
        for height in 2..=to_height {
            let previous = chain.last().cloned().unwrap();
            let generator = engine
                .delegates
                .scheduled_delegate(height, height)
                .expect("101 registered delegates cover every slot");

            let mut payload = vec![tag];
            payload.extend_from_slice(&height.to_be_bytes());
            chain.push(Block {
                id: sha256(&payload),
                height,
                timestamp: height * 10,
                previous_block: Some(previous.id),
                generator_public_key: generator,
                total_fee: 0,
                transactions: vec![],
            });
        }
        chain
    }

    async fn extend_local_chain(engine: &Engine, to_height: u64) {
        for block in build_fork(engine, to_height, 0).into_iter().skip(1) {
            engine.chain.apply_block(block).await.unwrap();
        }
    }

    fn tx(tag: u8, fee: u64) -> Transaction {
        Transaction {
            id: [tag; 32],
            sender_public_key: [200; 32],
            recipient: None,
            amount: 0,
            fee,
            timestamp: 0,
            delegate: None,
            signature: [0; 64],
        }
    }

    #[tokio::test]
    async fn test_bootstrap_replays_genesis_and_publishes_ready() {
        let engine = Engine::new(engine_config());
        let mut events = engine.bus.subscribe();

        engine.sync.load_block_chain(false).await.unwrap();

        // Genesis registrations seeded the registry through replay.
        assert_eq!(engine.delegates.registry().read().len(), 101);
        assert_eq!(engine.delegates.generate_delegate_list(1).len(), 101);

        let status = engine.sync.status();
        assert!(status.loaded);
        assert_eq!(status.height, 1);

        let mut saw_ready = false;
        while let Some(event) = events.try_recv() {
            if matches!(event, ChainEvent::BlockchainReady) {
                saw_ready = true;
            }
        }
        assert!(saw_ready);
    }

    #[tokio::test]
    async fn test_forging_drains_pool_into_new_block() {
        let engine = booted_engine().await;
        engine
            .submit_transaction(tx(1, 25))
            .unwrap()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(engine.pool.len(), 1);

        let generator = engine.delegates.scheduled_delegate(2, 2).unwrap();
        let forger = ForgerAdapter::new(Arc::clone(&engine.chain), Arc::clone(&engine.pool));
        forger.generate_block(generator, 20).await.unwrap();

        let tip = engine.chain.last_block();
        assert_eq!(tip.height, 2);
        assert_eq!(tip.total_fee, 25);
        assert_eq!(tip.transactions.len(), 1);
        assert!(engine.pool.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_slot_generator_is_rejected() {
        let engine = booted_engine().await;
        let scheduled = engine.delegates.scheduled_delegate(2, 2).unwrap();
        let list = engine.delegates.generate_delegate_list(2);
        let intruder = *list.iter().find(|pk| **pk != scheduled).unwrap();

        let mut chain = build_fork(&engine, 2, 0);
        let mut block = chain.pop().unwrap();
        block.generator_public_key = intruder;

        let rejected = engine.chain.apply_block(block).await;
        assert!(rejected.is_err());
        assert_eq!(engine.chain.last_block().height, 1);
    }

    #[tokio::test]
    async fn test_fork_beyond_rollback_bound_bans_peer() {
        let engine = booted_engine().await;
        extend_local_chain(&engine, 1012).await;
        assert_eq!(engine.chain.last_block().height, 1012);

        // Peer shares only genesis; divergence depth is 1011.
        engine
            .peers
            .install_chain(peer(), build_fork(&engine, 1013, 1));
        engine.sync.sync_cycle().await.unwrap();

        // No local block was deleted and the peer is banned.
        assert_eq!(engine.chain.last_block().height, 1012);
        assert_eq!(engine.chain.count().await.unwrap(), 1012);
        assert!(engine.peers.is_banned(&peer()));
        let causes: Vec<ForkCause> = engine.fork_log.events().iter().map(|e| e.cause).collect();
        assert_eq!(causes, vec![ForkCause::LongFork]);

        // A banned peer is never selected again.
        engine.sync.sync_cycle().await.unwrap();
        assert_eq!(engine.fork_log.len(), 1);
    }

    #[tokio::test]
    async fn test_fork_at_exact_rollback_bound_reorganizes() {
        let engine = booted_engine().await;
        extend_local_chain(&engine, 1011).await;

        // Divergence depth is exactly 1010: rollback must proceed.
        let peer_chain = build_fork(&engine, 1012, 1);
        let peer_tip = peer_chain.last().cloned().unwrap();
        engine.peers.install_chain(peer(), peer_chain);
        engine.sync.sync_cycle().await.unwrap();

        let tip = engine.chain.last_block();
        assert_eq!(tip.height, 1012);
        assert_eq!(tip.id, peer_tip.id, "local chain must follow the peer fork");
        assert!(!engine.peers.is_banned(&peer()));
    }

    #[tokio::test]
    async fn test_reorg_readmits_displaced_transactions() {
        let engine = booted_engine().await;
        extend_local_chain(&engine, 4).await;
        engine
            .submit_transaction(tx(9, 3))
            .unwrap()
            .await
            .unwrap()
            .unwrap();

        engine.peers.install_chain(peer(), build_fork(&engine, 6, 1));
        engine.sync.sync_cycle().await.unwrap();

        assert_eq!(engine.chain.last_block().height, 6);
        // The displaced transaction is back in the pool, not lost.
        assert_eq!(engine.pool.len(), 1);
        let causes: Vec<ForkCause> = engine.fork_log.events().iter().map(|e| e.cause).collect();
        assert_eq!(causes, vec![ForkCause::CommonAncestorMismatch]);
    }
}
