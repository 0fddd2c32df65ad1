//! # Slot Scheduler
//!
//! Maps wall-clock time to slot number and slot number to the delegate
//! expected to forge. Each slot is a fixed 10-second quantum; slot `s` is
//! assigned to `active_list[s % SLOTS_PER_ROUND]`.

use shared_types::{SLOTS_PER_ROUND, SLOT_DURATION_SECS};

/// Slot arithmetic anchored at the chain's genesis timestamp.
#[derive(Debug, Clone, Copy)]
pub struct Slots {
    genesis_timestamp: u64,
}

impl Slots {
    pub fn new(genesis_timestamp: u64) -> Self {
        Self { genesis_timestamp }
    }

    /// The slot containing `timestamp`. Timestamps before genesis clamp to
    /// slot 0.
    pub fn slot_number(&self, timestamp: u64) -> u64 {
        timestamp.saturating_sub(self.genesis_timestamp) / SLOT_DURATION_SECS
    }

    /// The wall-clock second at which `slot` opens.
    pub fn slot_time(&self, slot: u64) -> u64 {
        self.genesis_timestamp + slot * SLOT_DURATION_SECS
    }

    /// The first slot after the round window containing `slot`.
    pub fn last_slot_of_round(&self, slot: u64) -> u64 {
        let slots = SLOTS_PER_ROUND as u64;
        slot + (slots - slot % slots)
    }

    /// Index of `slot` within its round's active list.
    pub fn slot_index(&self, slot: u64) -> usize {
        (slot % SLOTS_PER_ROUND as u64) as usize
    }
}
