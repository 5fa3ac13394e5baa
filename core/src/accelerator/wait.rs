//! accelerator/wait.rs
//! Pluggable wait step used while busy-polling for job completion.
//!
//! Completion is always observed by polling. The strategy only decides how the
//! polling thread spends the gap between two checks.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub trait WaitStrategy: Send + Sync {
    /// Spend one short wait step. Must never block on the device.
    fn pause(&self);
}

/// Burns a few CPU pause hints. Lowest latency, costs cycles.
#[derive(Debug, Clone, Copy)]
pub struct SpinPause {
    spins: u32,
}

impl SpinPause {
    pub fn new(spins: u32) -> Self {
        Self { spins: spins.max(1) }
    }
}

impl WaitStrategy for SpinPause {
    #[inline]
    fn pause(&self) {
        for _ in 0..self.spins {
            std::hint::spin_loop();
        }
    }
}

/// Gives the rest of the time slice back to the scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldWait;

impl WaitStrategy for YieldWait {
    fn pause(&self) {
        thread::yield_now();
    }
}

/// Short OS sleep, for targets without a usable pause instruction.
#[derive(Debug, Clone, Copy)]
pub struct SleepWait(pub Duration);

impl WaitStrategy for SleepWait {
    fn pause(&self) {
        thread::sleep(self.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitKind {
    #[default]
    Spin,
    Yield,
    Sleep,
}

impl WaitKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "spin" => Some(WaitKind::Spin),
            "yield" => Some(WaitKind::Yield),
            "sleep" => Some(WaitKind::Sleep),
            _ => None,
        }
    }
}
