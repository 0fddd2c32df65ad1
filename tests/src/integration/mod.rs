//! Cross-subsystem integration tests.

pub mod consensus_properties;
pub mod engine_flows;
