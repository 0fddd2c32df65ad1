//! # Event Subscriber
//!
//! Defines the receiving side of the event bus.

use crate::events::ChainEvent;
use tokio::sync::broadcast;
use tracing::warn;

/// A handle to a single subscription on the event bus.
///
/// Events of a given type are observed in publish order. A subscriber that
/// falls more than the channel capacity behind loses the oldest events and
/// continues from the earliest retained one; a warning is logged when that
/// happens.
pub struct Subscription {
    receiver: broadcast::Receiver<ChainEvent>,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<ChainEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next event, or `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<ChainEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Subscriber lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive. `None` when no event is pending.
    pub fn try_recv(&mut self) -> Option<ChainEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Subscriber lagged; events dropped");
                }
                Err(_) => return None,
            }
        }
    }
}
