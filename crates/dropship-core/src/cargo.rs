//! Shared cargo hold: a fixed number of slots shared by the whole crew.
//!
//! The hold keeps items across phases within a run and is emptied when a
//! new run lands.

use dropship_events::PhaseHooks;
use dropship_types::{ItemKind, Phase};
use tracing::{debug, warn};

use crate::config::{CargoConfig, MAX_CARGO_SLOTS};

/// Errors returned by cargo operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CargoError {
    /// Every slot is occupied.
    #[error("cargo full ({capacity} slots), cannot add {kind:?}")]
    Full {
        /// The item that did not fit.
        kind: ItemKind,
        /// Total slot count.
        capacity: usize,
    },

    /// No slot holds the requested item.
    #[error("no {kind:?} in cargo")]
    NotFound {
        /// The item that was requested.
        kind: ItemKind,
    },
}

/// Read-only count query over a cargo hold.
pub trait CargoLedger {
    /// Number of slots holding `kind`.
    fn count_of(&self, kind: ItemKind) -> usize;
}

/// Slot-based team inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedCargo {
    slots: Vec<Option<ItemKind>>,
}

impl SharedCargo {
    /// Create an empty hold with `config.max_slots` slots, capped at
    /// [`MAX_CARGO_SLOTS`].
    pub fn new(config: &CargoConfig) -> Self {
        if config.max_slots > MAX_CARGO_SLOTS {
            warn!(
                requested = config.max_slots,
                limit = MAX_CARGO_SLOTS,
                "Cargo slot count over limit, capping"
            );
        }
        let slots = config.max_slots.min(MAX_CARGO_SLOTS);
        let capacity = usize::try_from(slots).unwrap_or(0);
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Put `kind` in the first free slot.
    ///
    /// Returns the slot index used.
    ///
    /// # Errors
    ///
    /// Returns [`CargoError::Full`] when every slot is occupied.
    pub fn try_add(&mut self, kind: ItemKind) -> Result<usize, CargoError> {
        let capacity = self.capacity();
        let Some((index, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
        else {
            warn!(kind = ?kind, capacity, "Cargo full");
            return Err(CargoError::Full { kind, capacity });
        };
        *slot = Some(kind);
        debug!(kind = ?kind, slot = index, "Cargo item added");
        Ok(index)
    }

    /// Empty the first slot holding `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`CargoError::NotFound`] when no slot holds `kind`.
    pub fn remove(&mut self, kind: ItemKind) -> Result<usize, CargoError> {
        let Some((index, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| **slot == Some(kind))
        else {
            warn!(kind = ?kind, "Item not in cargo");
            return Err(CargoError::NotFound { kind });
        };
        *slot = None;
        debug!(kind = ?kind, slot = index, "Cargo item removed");
        Ok(index)
    }

    /// Empty every slot holding an item that matches `predicate`.
    ///
    /// Returns the number of slots emptied.
    pub fn remove_where(&mut self, predicate: impl Fn(ItemKind) -> bool) -> usize {
        let mut removed = 0_usize;
        for slot in &mut self.slots {
            if slot.is_some_and(&predicate) {
                *slot = None;
                removed = removed.saturating_add(1);
            }
        }
        removed
    }

    /// Whether any slot holds `kind`.
    pub fn contains(&self, kind: ItemKind) -> bool {
        self.slots.contains(&Some(kind))
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Number of empty slots.
    pub fn free_slots(&self) -> usize {
        self.capacity().saturating_sub(self.occupied())
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.free_slots() == 0
    }

    /// Occupied fraction in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn fill_ratio(&self) -> f64 {
        if self.slots.is_empty() {
            return 0.0;
        }
        self.occupied() as f64 / self.capacity() as f64
    }

    /// Occupied slots, in slot order.
    pub fn items(&self) -> Vec<ItemKind> {
        self.slots.iter().flatten().copied().collect()
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}

impl CargoLedger for SharedCargo {
    fn count_of(&self, kind: ItemKind) -> usize {
        self.slots.iter().filter(|slot| **slot == Some(kind)).count()
    }
}

impl PhaseHooks for SharedCargo {
    fn on_enter(&mut self, phase: Phase) {
        if phase == Phase::Landing {
            self.clear();
            debug!("Cargo cleared for new run");
        }
    }
}
