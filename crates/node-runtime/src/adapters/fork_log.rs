//! Append-only fork event log, kept in memory for forensic inspection.

use async_trait::async_trait;
use dc_03_chain_sync::ForkLog;
use parking_lot::RwLock;
use shared_types::ForkEvent;
use tracing::warn;

#[derive(Default)]
pub struct InMemoryForkLog {
    events: RwLock<Vec<ForkEvent>>,
}

impl InMemoryForkLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<ForkEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl ForkLog for InMemoryForkLog {
    async fn record(&self, event: ForkEvent) {
        warn!(
            height = event.block_height,
            cause = ?event.cause,
            "Fork recorded"
        );
        self.events.write().push(event);
    }
}
