//! # In-Process Peer Gateway
//!
//! Peer table with ban/demotion bookkeeping over in-process peer chains.
//! Raw HTTP transport is an external collaborator; this gateway serves
//! whatever chain data has been installed for a peer, which is also how
//! the integration tests drive reorg scenarios end to end.

use super::chain_store::InMemoryChainStore;
use async_trait::async_trait;
use dc_03_chain_sync::{ChainStore, LoadBlocksFailure, PeerGateway};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use shared_types::{Block, BlockId, Peer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct PeerEntry {
    height: u64,
    chain: Vec<Block>,
    banned_until: Option<Instant>,
}

impl PeerEntry {
    fn usable(&self, now: Instant) -> bool {
        self.height > 0 && self.banned_until.is_none_or(|until| until <= now)
    }
}

/// Peer gateway over installed in-process chains.
pub struct StaticPeerGateway {
    local: Arc<InMemoryChainStore>,
    peers: RwLock<HashMap<Peer, PeerEntry>>,
}

impl StaticPeerGateway {
    pub fn new(local: Arc<InMemoryChainStore>, seed: Vec<Peer>) -> Self {
        let peers = seed
            .into_iter()
            .map(|peer| (peer, PeerEntry::default()))
            .collect();
        Self {
            local,
            peers: RwLock::new(peers),
        }
    }

    /// Install (or replace) the chain served for `peer`. The peer's
    /// reported height follows its chain tip.
    pub fn install_chain(&self, peer: Peer, chain: Vec<Block>) {
        let height = chain.last().map_or(0, |b| b.height);
        let mut peers = self.peers.write();
        let entry = peers.entry(peer).or_default();
        entry.chain = chain;
        entry.height = height;
    }

    fn suspend(&self, peer: Peer, duration_secs: u64) {
        if let Some(entry) = self.peers.write().get_mut(&peer) {
            entry.banned_until = Some(Instant::now() + Duration::from_secs(duration_secs));
        }
    }

    /// Whether `peer` is currently banned or demoted.
    pub fn is_banned(&self, peer: &Peer) -> bool {
        let now = Instant::now();
        self.peers
            .read()
            .get(peer)
            .is_some_and(|entry| entry.banned_until.is_some_and(|until| until > now))
    }
}

#[async_trait]
impl PeerGateway for StaticPeerGateway {
    async fn random_peer_height(&self) -> Option<(Peer, u64)> {
        let now = Instant::now();
        let candidates: Vec<(Peer, u64)> = self
            .peers
            .read()
            .iter()
            .filter(|(_, entry)| entry.usable(now))
            .map(|(peer, entry)| (*peer, entry.height))
            .collect();
        candidates.choose(&mut rand::thread_rng()).copied()
    }

    async fn get_common_block(&self, peer: Peer, height: u64) -> Option<Block> {
        let peers = self.peers.read();
        let entry = peers.get(&peer)?;
        entry
            .chain
            .iter()
            .rev()
            .find(|block| block.height <= height && self.local.contains(&block.id))
            .cloned()
    }

    async fn load_blocks_from_peer(
        &self,
        peer: Peer,
        since_block: BlockId,
    ) -> Result<Block, LoadBlocksFailure> {
        let pending: Vec<Block> = {
            let peers = self.peers.read();
            let Some(entry) = peers.get(&peer) else {
                return Err(LoadBlocksFailure {
                    reason: "unknown peer".into(),
                    last_valid: None,
                });
            };
            let Some(position) = entry.chain.iter().position(|b| b.id == since_block) else {
                return Err(LoadBlocksFailure {
                    reason: "peer does not know the requested block".into(),
                    last_valid: None,
                });
            };
            entry.chain[position + 1..].to_vec()
        };

        let mut last_valid: Option<Block> = None;
        for block in pending {
            match self.local.apply_block(block.clone()).await {
                Ok(()) => last_valid = Some(block),
                Err(e) => {
                    return Err(LoadBlocksFailure {
                        reason: e.to_string(),
                        last_valid,
                    });
                }
            }
        }

        match last_valid {
            Some(block) => {
                debug!(%peer, height = block.height, "Loaded blocks from peer");
                Ok(block)
            }
            None => Ok(self.local.last_block()),
        }
    }

    async fn ban_peer(&self, peer: Peer, duration_secs: u64) {
        warn!(%peer, duration_secs, "Peer banned");
        self.suspend(peer, duration_secs);
    }

    async fn demote_peer(&self, peer: Peer, duration_secs: u64) {
        debug!(%peer, duration_secs, "Peer demoted");
        self.suspend(peer, duration_secs);
    }
}
