//! accelerator/discovery.rs
//! One-shot capacity discovery.
//!
//! Summary: sums the depth of every work queue the accelerator reports.
//! Absence or failure degrades to zero capacity with a single warning.

use log::{debug, warn};

use crate::accelerator::{Accelerator, WorkQueue};

/// Combined depth of all queues, saturating at `usize::MAX`.
pub fn total_depth(queues: &[WorkQueue]) -> usize {
    queues
        .iter()
        .fold(0usize, |acc, wq| acc.saturating_add(wq.size as usize))
}

/// Return the number of job slots the accelerator can back.
pub fn discover_capacity<A: Accelerator>(accel: &A) -> usize {
    match accel.work_queues() {
        Ok(queues) => {
            let depth = total_depth(&queues);
            if depth == 0 {
                warn!(
                    "hardware-assisted DEFLATE unavailable, falling back to software codec \
                     (work queues: {}, total depth: 0)",
                    queues.len()
                );
            } else {
                debug!("discovered {} work queues, total depth {}", queues.len(), depth);
            }
            depth
        }
        Err(e) => {
            warn!("hardware-assisted DEFLATE unavailable, falling back to software codec ({e})");
            0
        }
    }
}
