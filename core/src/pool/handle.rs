//! pool/handle.rs
//! Opaque job handles.
//!
//! A handle encodes its slot as `slot_count - index`, giving ids in
//! `[1, slot_count]`. Zero is unrepresentable, so no handle can ever be
//! mistaken for a failed acquisition.

use std::fmt;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobHandle(NonZeroUsize);

impl JobHandle {
    pub(crate) fn from_index(index: usize, slot_count: usize) -> Option<Self> {
        if index >= slot_count {
            return None;
        }
        NonZeroUsize::new(slot_count - index).map(JobHandle)
    }

    pub(crate) fn index(self, slot_count: usize) -> Option<usize> {
        slot_count.checked_sub(self.0.get()).filter(|&i| i < slot_count)
    }

    /// Raw id in `[1, slot_count]`.
    pub fn id(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}
