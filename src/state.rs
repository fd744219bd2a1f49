// src/state.rs
//
// Slot state tracked by each side of the dialog.
//
// The agent and the user each hold their own slot array; the two can disagree
// (the user may believe a slot is provided while the agent never heard it),
// which is what makes confirmation turns meaningful.

use serde::{Deserialize, Serialize};

use crate::actions::SlotId;

/// Status of a single slot.
///
/// `Obtained` covers both sides' intermediate state: the agent has heard a
/// value ("obtained"), or the user believes it has provided one ("provided").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    Empty,
    Obtained,
    Confirmed,
}

/// Ordered array of slot statuses, indexed by slot id.
///
/// All scans resolve ties by lowest slot id first, so behavior is fully
/// reproducible for a given seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotArray {
    slots: Vec<SlotStatus>,
}

impl SlotArray {
    /// Create `num_slots` slots, all `Empty`.
    pub fn new(num_slots: usize) -> Self {
        Self {
            slots: vec![SlotStatus::Empty; num_slots],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn status(&self, id: SlotId) -> SlotStatus {
        self.slots[id]
    }

    pub fn mark_empty(&mut self, id: SlotId) {
        self.slots[id] = SlotStatus::Empty;
    }

    pub fn mark_obtained(&mut self, id: SlotId) {
        self.slots[id] = SlotStatus::Obtained;
    }

    pub fn mark_confirmed(&mut self, id: SlotId) {
        self.slots[id] = SlotStatus::Confirmed;
    }

    /// Mark every currently-empty slot as obtained.
    pub fn mark_all_obtained(&mut self) {
        for status in self.slots.iter_mut() {
            if *status == SlotStatus::Empty {
                *status = SlotStatus::Obtained;
            }
        }
    }

    /// Reset every slot to `Empty`.
    pub fn clear(&mut self) {
        for status in self.slots.iter_mut() {
            *status = SlotStatus::Empty;
        }
    }

    /// Lowest-id slot still `Empty`, if any.
    pub fn first_empty(&self) -> Option<SlotId> {
        self.slots.iter().position(|s| *s == SlotStatus::Empty)
    }

    /// Lowest-id slot obtained but not yet confirmed, if any.
    pub fn first_unconfirmed(&self) -> Option<SlotId> {
        self.slots.iter().position(|s| *s == SlotStatus::Obtained)
    }

    /// True when every slot is `Confirmed`.
    pub fn all_confirmed(&self) -> bool {
        self.slots.iter().all(|s| *s == SlotStatus::Confirmed)
    }
}
