//! telemetry/snapshot.rs
//! Immutable, serializable view of a dispatcher's counters.

use serde::{Deserialize, Serialize};

use crate::compression::DecompressMode;
use crate::telemetry::counters::CodecCounters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecSnapshot {
    pub pool_ready: bool,
    pub pool_capacity: usize,
    pub mode: String,
    pub pending_async: usize,
    pub hardware_ops: u64,
    pub software_ops: u64,
    pub hw_fallbacks: u64,
    /// Share of hardware attempts that had to be redone in software.
    pub fallback_ratio: f64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub flushes: u64,
}

impl CodecSnapshot {
    pub fn from(
        counters: &CodecCounters,
        pool_ready: bool,
        pool_capacity: usize,
        mode: DecompressMode,
        pending_async: usize,
    ) -> Self {
        let hardware_ops = counters.hardware_ops();
        let attempts = hardware_ops + counters.hw_fallbacks;
        let fallback_ratio = if attempts > 0 {
            counters.hw_fallbacks as f64 / attempts as f64
        } else {
            0.0
        };

        Self {
            pool_ready,
            pool_capacity,
            mode: format!("{:?}", mode),
            pending_async,
            hardware_ops,
            software_ops: counters.software_ops(),
            hw_fallbacks: counters.hw_fallbacks,
            fallback_ratio,
            bytes_in: counters.bytes_in,
            bytes_out: counters.bytes_out,
            flushes: counters.flushes,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
