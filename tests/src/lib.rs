//! # Delegate-Chain Test Suite
//!
//! Unified test crate:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── consensus_properties.rs   # Cross-subsystem consensus invariants
//!     └── engine_flows.rs           # Full-engine sync and reorg flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dc-tests
//! cargo test -p dc-tests integration::consensus_properties::
//! cargo test -p dc-tests integration::engine_flows::
//! ```

pub mod integration;
