//! pool/arena.rs
//! Contiguous descriptor arena addressed by slot index.
//!
//! One allocation holds every descriptor. Slots are reached only through the
//! bounds-checked `slot` accessor; there is no side table of references.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct JobArena<J> {
    slots: Box<[Mutex<J>]>,
}

impl<J> JobArena<J> {
    pub fn new(jobs: Vec<J>) -> Self {
        Self { slots: jobs.into_iter().map(Mutex::new).collect() }
    }

    pub fn empty() -> Self {
        Self { slots: Box::new([]) }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Lock the descriptor at `index`.
    ///
    /// Callers hold the slot's pool lock, so this mutex is never contended;
    /// it only provides the interior mutability. A poisoned descriptor is
    /// still handed out: the device state it guards is owned by the holder.
    pub fn slot(&self, index: usize) -> Option<MutexGuard<'_, J>> {
        self.slots
            .get(index)
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
