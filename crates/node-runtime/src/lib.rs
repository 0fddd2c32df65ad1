//! # Delegate-Chain Node Runtime
//!
//! Wires the consensus subsystems into a runnable node:
//!
//! - `config` - JSON runtime configuration
//! - `genesis` - deterministic genesis block construction
//! - `adapters` - in-process port implementations
//! - `container` - engine assembly and loop startup

pub mod adapters;
pub mod config;
pub mod container;
pub mod genesis;

pub use config::{ConfigError, NodeConfig};
pub use container::{Engine, EngineHandles};
pub use genesis::build_genesis;
