//! telemetry/counters.rs
//! Per-dispatcher path counters.
//!
//! Summary: Counts which path (hardware or software) serviced each request
//! and how often hardware failed over. Converted into an immutable
//! `CodecSnapshot` on demand.
use std::ops::AddAssign;

/// Deterministic counters owned by one dispatcher instance.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct CodecCounters {
    pub hw_compress: u64,
    pub sw_compress: u64,
    pub hw_decompress_sync: u64,
    pub hw_decompress_async: u64,
    pub sw_decompress: u64,
    /// Hardware attempts that ended in a software retry.
    pub hw_fallbacks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub flushes: u64,
}

impl CodecCounters {
    /// Record one compression. `raw_len` in, `packed_len` out.
    pub fn add_compress(&mut self, hardware: bool, raw_len: usize, packed_len: usize) {
        if hardware {
            self.hw_compress += 1;
        } else {
            self.sw_compress += 1;
        }
        self.bytes_in += raw_len as u64;
        self.bytes_out += packed_len as u64;
    }

    /// Record one software decompression.
    pub fn add_sw_decompress(&mut self, packed_len: usize, raw_len: usize) {
        self.sw_decompress += 1;
        self.bytes_in += packed_len as u64;
        self.bytes_out += raw_len as u64;
    }

    pub fn add_hw_decompress_sync(&mut self, packed_len: usize, raw_len: usize) {
        self.hw_decompress_sync += 1;
        self.bytes_in += packed_len as u64;
        self.bytes_out += raw_len as u64;
    }

    /// Asynchronous jobs are counted at submission.
    pub fn add_hw_decompress_async(&mut self, packed_len: usize, raw_len: usize) {
        self.hw_decompress_async += 1;
        self.bytes_in += packed_len as u64;
        self.bytes_out += raw_len as u64;
    }

    pub fn add_fallback(&mut self) {
        self.hw_fallbacks += 1;
    }

    pub fn hardware_ops(&self) -> u64 {
        self.hw_compress + self.hw_decompress_sync + self.hw_decompress_async
    }

    pub fn software_ops(&self) -> u64 {
        self.sw_compress + self.sw_decompress
    }
}

impl AddAssign for CodecCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.hw_compress         += rhs.hw_compress;
        self.sw_compress         += rhs.sw_compress;
        self.hw_decompress_sync  += rhs.hw_decompress_sync;
        self.hw_decompress_async += rhs.hw_decompress_async;
        self.sw_decompress       += rhs.sw_decompress;
        self.hw_fallbacks        += rhs.hw_fallbacks;
        self.bytes_in            += rhs.bytes_in;
        self.bytes_out           += rhs.bytes_out;
        self.flushes             += rhs.flushes;
    }
}
