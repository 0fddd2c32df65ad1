//! # In-Memory Ledger Store
//!
//! Honors the merge-and-get contract: each merge is atomic and balance
//! fields are additive deltas, never overwrites. Address-keyed and
//! key-keyed accounts live in separate namespaces; consensus only ever
//! addresses an account through one of the two.

use async_trait::async_trait;
use dc_02_rounds::LedgerGateway;
use dc_03_chain_sync::LedgerVerifier;
use parking_lot::RwLock;
use shared_types::{AccountDelta, AccountTarget, BlockId, LedgerError, PublicKey};
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Default, Clone)]
struct AccountRecord {
    balance: i64,
    unconfirmed_balance: i64,
    /// Last block whose application touched this account. The bootstrap
    /// linkage check compares these against blocks actually applied.
    block_id: Option<BlockId>,
}

/// In-process ledger store.
#[derive(Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<AccountTarget, AccountRecord>>,
    delegate_rows: RwLock<Vec<PublicKey>>,
    applied_blocks: RwLock<HashSet<BlockId>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirmed balance of an account, zero when absent.
    pub fn balance(&self, target: &AccountTarget) -> i64 {
        self.accounts
            .read()
            .get(target)
            .map_or(0, |record| record.balance)
    }

    /// Unconfirmed balance of an account, zero when absent.
    pub fn unconfirmed_balance(&self, target: &AccountTarget) -> i64 {
        self.accounts
            .read()
            .get(target)
            .map_or(0, |record| record.unconfirmed_balance)
    }

    /// Stamp every account with the block whose application just completed.
    pub fn link_accounts(&self, block_id: BlockId) {
        self.applied_blocks.write().insert(block_id);
        for record in self.accounts.write().values_mut() {
            record.block_id = Some(block_id);
        }
    }

    /// Record a confirmed delegate registration row.
    pub fn mark_delegate(&self, public_key: PublicKey) {
        let mut rows = self.delegate_rows.write();
        if !rows.contains(&public_key) {
            rows.push(public_key);
        }
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn merge_account_and_get(&self, delta: AccountDelta) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write();
        let record = accounts.entry(delta.target.clone()).or_default();
        record.balance += delta.balance;
        record.unconfirmed_balance += delta.unconfirmed_balance;
        trace!(
            target_account = ?delta.target,
            balance = record.balance,
            "Account merged"
        );
        Ok(())
    }
}

#[async_trait]
impl LedgerVerifier for InMemoryLedger {
    async fn linkage_consistent(&self) -> Result<bool, LedgerError> {
        let accounts = self.accounts.read();
        if accounts.is_empty() {
            return Ok(false);
        }
        let applied = self.applied_blocks.read();
        Ok(accounts
            .values()
            .all(|record| matches!(record.block_id, Some(id) if applied.contains(&id))))
    }

    async fn delegate_rows(&self) -> Result<Vec<PublicKey>, LedgerError> {
        Ok(self.delegate_rows.read().clone())
    }

    async fn reset_tables(&self) -> Result<(), LedgerError> {
        self.accounts.write().clear();
        self.delegate_rows.write().clear();
        self.applied_blocks.write().clear();
        Ok(())
    }
}
