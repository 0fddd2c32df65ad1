//! Ports for chain synchronization.

pub mod outbound;

pub use outbound::{
    ChainStore, DelegateSeed, ForkLog, LedgerVerifier, PeerGateway, RoundGateway, UnconfirmedPool,
};
