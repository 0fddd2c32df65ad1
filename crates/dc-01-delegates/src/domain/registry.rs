//! # Delegate Registry
//!
//! In-memory map of delegate public key → cumulative vote weight, username
//! and accrued fee. Source of truth for active-list selection.
//!
//! The registry is owned by the engine instance and mutated only inside
//! Sequence-ordered callbacks; there are no module-level singletons.

use shared_types::{Block, Delegate, PublicKey, Transaction};
use std::collections::HashMap;
use tracing::debug;

/// The registry of confirmed and unconfirmed delegates.
#[derive(Debug, Default)]
pub struct DelegateRegistry {
    delegates: HashMap<PublicKey, Delegate>,
    unconfirmed: HashMap<PublicKey, Delegate>,
}

impl DelegateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered delegates.
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }

    /// Insert or replace a confirmed delegate.
    pub fn save_to_memory(&mut self, delegate: Delegate) {
        self.delegates.insert(delegate.public_key, delegate);
    }

    /// Get a confirmed delegate.
    pub fn get(&self, public_key: &PublicKey) -> Option<&Delegate> {
        self.delegates.get(public_key)
    }

    /// Credit (or debit, on rollback) a delegate's accrued fee.
    pub fn add_fee(&mut self, public_key: &PublicKey, amount: i64) {
        if let Some(delegate) = self.delegates.get_mut(public_key) {
            delegate.accrued_fee += amount;
        }
    }

    /// Apply one vote to each named delegate. An empty slice votes for
    /// every registered delegate.
    pub fn voting(&mut self, public_keys: &[PublicKey]) {
        if public_keys.is_empty() {
            for delegate in self.delegates.values_mut() {
                delegate.vote += 1;
            }
        } else {
            for public_key in public_keys {
                if let Some(delegate) = self.delegates.get_mut(public_key) {
                    delegate.vote += 1;
                }
            }
        }
    }

    /// True iff every named delegate is registered.
    pub fn check_votes(&self, public_keys: &[PublicKey]) -> bool {
        public_keys.iter().all(|pk| self.delegates.contains_key(pk))
    }

    /// Seed the registry from persisted delegate rows at bootstrap.
    pub fn load_delegates_list(&mut self, rows: &[PublicKey]) {
        for public_key in rows {
            self.delegates
                .entry(*public_key)
                .or_insert_with(|| Delegate::new(*public_key));
        }
        debug!(count = rows.len(), "Delegate registry seeded");
    }

    /// All delegate ids ordered descending by vote weight, ties broken by
    /// ascending lexicographic public key. The total order is required for
    /// cross-node determinism.
    pub fn keys_sorted_by_vote(&self) -> Vec<PublicKey> {
        let mut keys: Vec<&Delegate> = self.delegates.values().collect();
        keys.sort_by(|a, b| {
            b.vote
                .cmp(&a.vote)
                .then_with(|| a.public_key.cmp(&b.public_key))
        });
        keys.into_iter().map(|d| d.public_key).collect()
    }

    /// Track a delegate registration that is not yet in a block.
    pub fn add_unconfirmed(&mut self, delegate: Delegate) -> bool {
        if self.unconfirmed.contains_key(&delegate.public_key) {
            return false;
        }
        self.unconfirmed.insert(delegate.public_key, delegate);
        true
    }

    pub fn get_unconfirmed(&self, public_key: &PublicKey) -> Option<&Delegate> {
        self.unconfirmed.get(public_key)
    }

    pub fn remove_unconfirmed(&mut self, public_key: &PublicKey) {
        self.unconfirmed.remove(public_key);
    }

    /// Absorb delegate registrations carried by an applied block.
    pub fn absorb_block(&mut self, block: &Block) {
        for transaction in &block.transactions {
            if let Some(registration) = delegate_from_transaction(transaction) {
                self.remove_unconfirmed(&registration.public_key);
                self.save_to_memory(registration);
            }
        }
    }

    /// Track the registration carried by an unconfirmed transaction.
    pub fn absorb_unconfirmed_transaction(&mut self, transaction: &Transaction) {
        if let Some(registration) = delegate_from_transaction(transaction) {
            self.add_unconfirmed(registration);
        }
    }
}

fn delegate_from_transaction(transaction: &Transaction) -> Option<Delegate> {
    transaction.delegate.as_ref().map(|asset| Delegate {
        public_key: transaction.sender_public_key,
        username: Some(asset.username.clone()),
        vote: 0,
        accrued_fee: 0,
        transaction_id: Some(transaction.id),
    })
}
