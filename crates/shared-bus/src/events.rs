//! # Chain Events
//!
//! Defines the notification types that flow through the shared bus. Call
//! order is guaranteed per event type: subscribers observe `RoundFinished`
//! notifications in the order the rounds closed.

use serde::{Deserialize, Serialize};
use shared_types::Block;

/// All notifications that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChainEvent {
    /// A block was applied to the chain tip. Carries the full block so
    /// subscribers can absorb its transactions (delegate registrations).
    BlockApplied {
        /// The applied block.
        block: Block,
    },

    /// A round closed and its fee pool was distributed.
    RoundFinished {
        /// The closed round's number.
        round: u64,
    },

    /// The peer table is populated; sync and forging loops may start.
    PeerReady,

    /// Chain bootstrap completed; the node is ready to serve.
    BlockchainReady,
}

/// Coarse routing topic for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Block lifecycle events.
    Chain,
    /// Round accounting events.
    Rounds,
    /// Node lifecycle events.
    Lifecycle,
}

impl ChainEvent {
    /// The topic this event routes under.
    pub fn topic(&self) -> EventTopic {
        match self {
            ChainEvent::BlockApplied { .. } => EventTopic::Chain,
            ChainEvent::RoundFinished { .. } => EventTopic::Rounds,
            ChainEvent::PeerReady | ChainEvent::BlockchainReady => EventTopic::Lifecycle,
        }
    }
}
