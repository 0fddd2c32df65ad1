//! Driven ports (outbound dependencies) of round accounting.

use async_trait::async_trait;
use shared_types::{AccountDelta, LedgerError, PublicKey};

/// The ledger store's account-merge contract.
///
/// Each call must be atomic, and balance fields are additive deltas, never
/// overwrites. Distribution correctness depends on both properties.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Merge `delta` into the target account.
    async fn merge_account_and_get(&self, delta: AccountDelta) -> Result<(), LedgerError>;
}

/// Access to the delegate subsystem needed at round close.
pub trait DelegateSchedule: Send + Sync {
    /// The deterministic active list for the round containing `height`.
    fn generate_delegate_list(&self, height: u64) -> Vec<PublicKey>;

    /// Credit (negative on rollback) a delegate's accrued fee.
    fn add_fee(&self, public_key: &PublicKey, amount: i64);
}
