//! Ports for round accounting.

pub mod outbound;

pub use outbound::{DelegateSchedule, LedgerGateway};
