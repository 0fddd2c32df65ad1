//! # Shared Types Crate
//!
//! This crate contains all domain entities and chain constants shared across
//! the Delegate-Chain subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **No hidden state**: Entities are plain data; registries and transient
//!   maps are owned by the subsystem that mutates them.

pub mod constants;
pub mod entities;
pub mod errors;

pub use constants::*;
pub use entities::*;
pub use errors::*;
