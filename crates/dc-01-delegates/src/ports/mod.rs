//! Ports for the delegate subsystem.

pub mod outbound;

pub use outbound::{BlockForger, LastBlockSource, SyncProbe, SystemTimeSource, TimeSource};
