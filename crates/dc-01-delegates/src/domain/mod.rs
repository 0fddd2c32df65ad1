//! Domain logic for the delegate subsystem.

pub mod active_list;
pub mod error;
pub mod keyring;
pub mod registry;
pub mod slots;

pub use active_list::{generate_active_list, ActiveList};
pub use error::{DelegateError, DelegateResult};
pub use keyring::ForgingKeyring;
pub use registry::DelegateRegistry;
pub use slots::Slots;
