//! In-process port implementations connecting the subsystems.

pub mod chain_store;
pub mod fork_log;
pub mod glue;
pub mod ledger;
pub mod peers;
pub mod unconfirmed;

pub use chain_store::InMemoryChainStore;
pub use fork_log::InMemoryForkLog;
pub use glue::{
    ForgerAdapter, RegistrySeedAdapter, RoundDirectionAdapter, ScheduleAdapter, SyncProbeAdapter,
    TipAdapter,
};
pub use ledger::InMemoryLedger;
pub use peers::StaticPeerGateway;
pub use unconfirmed::InMemoryUnconfirmedPool;
