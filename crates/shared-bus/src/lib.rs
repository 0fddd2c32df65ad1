//! # Shared Bus - Typed Event Bus for Inter-Subsystem Notifications
//!
//! Subsystems never call each other's notification handlers directly. A
//! publisher emits a [`ChainEvent`]; every subscriber observes events of a
//! given type in publish order.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Rounds (2)  │                    │ Delegates(1) │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Every variant is an explicit, typed notification; there is no
//! string-keyed dispatch and no implicit handler-name convention.

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ChainEvent, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::Subscription;

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
