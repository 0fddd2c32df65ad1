//! # Unconfirmed Transaction Pool
//!
//! Admitted transactions hold their cost against the sender's unconfirmed
//! balance until they are forged into a block or displaced by a rollback.

use super::ledger::InMemoryLedger;
use async_trait::async_trait;
use dc_02_rounds::LedgerGateway;
use dc_03_chain_sync::UnconfirmedPool;
use parking_lot::Mutex;
use shared_types::{AccountDelta, AccountTarget, LedgerError, Transaction};
use std::sync::Arc;
use tracing::debug;

/// In-process unconfirmed pool.
pub struct InMemoryUnconfirmedPool {
    pool: Mutex<Vec<Transaction>>,
    ledger: Arc<InMemoryLedger>,
}

impl InMemoryUnconfirmedPool {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            pool: Mutex::new(Vec::new()),
            ledger,
        }
    }

    fn cost(transaction: &Transaction) -> i64 {
        (transaction.amount + transaction.fee) as i64
    }

    /// Admit a transaction, reserving its cost against the sender's
    /// unconfirmed balance.
    pub async fn admit(&self, transaction: Transaction) -> Result<(), LedgerError> {
        self.ledger
            .merge_account_and_get(AccountDelta {
                target: AccountTarget::PublicKey(transaction.sender_public_key),
                balance: 0,
                unconfirmed_balance: -Self::cost(&transaction),
            })
            .await?;
        self.pool.lock().push(transaction);
        Ok(())
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.pool.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.lock().is_empty()
    }

    /// Drain the pool for inclusion in a forged block. The unconfirmed
    /// reservation stays: confirmation replaces it, it is not returned.
    pub fn take_all(&self) -> Vec<Transaction> {
        self.pool.lock().drain(..).collect()
    }
}

#[async_trait]
impl UnconfirmedPool for InMemoryUnconfirmedPool {
    async fn undo_unconfirmed_list(&self) -> Result<Vec<Transaction>, LedgerError> {
        let drained: Vec<Transaction> = self.pool.lock().drain(..).collect();
        for transaction in &drained {
            self.ledger
                .merge_account_and_get(AccountDelta {
                    target: AccountTarget::PublicKey(transaction.sender_public_key),
                    balance: 0,
                    unconfirmed_balance: Self::cost(transaction),
                })
                .await?;
        }
        debug!(count = drained.len(), "Unconfirmed pool displaced");
        Ok(drained)
    }

    async fn process_unconfirmed(&self, transaction: Transaction) {
        // Re-admission after a reorg; a ledger rejection only drops the
        // transaction, it does not fail the reorg.
        if let Err(e) = self.admit(transaction).await {
            debug!(error = %e, "Displaced transaction dropped on re-admission");
        }
    }
}
