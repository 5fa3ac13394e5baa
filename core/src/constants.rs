//! constants.rs
//! Stable identifiers and tuning defaults for the accelerated DEFLATE codec.

/// Method byte persisted in compressed block headers.
/// Changing it breaks every block already written to disk.
pub const METHOD_BYTE_DEFLATE_QPL: u8 = 0x99;

/// Textual codec name used by the codec registry.
pub const CODEC_NAME_DEFLATE_QPL: &str = "DEFLATE_QPL";

/// Fixed overhead of the zlib-aligned compressed size bound.
pub const BOUND_OVERHEAD: usize = 13;

/// Pause hints issued per wait step by the spin strategy.
pub const DEFAULT_SPIN_ITERATIONS: u32 = 64;

/// Sleep length per wait step for the sleep strategy.
pub const DEFAULT_SLEEP_MICROS: u64 = 1;

/// Environment variables read by `AccelConfig::from_env`.
pub mod env {
    /// Comma-separated work-queue depths, e.g. `"32,32"`.
    pub const WORK_QUEUES: &str = "DEFLATE_ACCEL_WORK_QUEUES";
    /// One of `spin`, `yield`, `sleep`.
    pub const WAIT: &str = "DEFLATE_ACCEL_WAIT";
    /// Upper bound on random slot probes per acquisition.
    pub const RETRY_LIMIT: &str = "DEFLATE_ACCEL_RETRY_LIMIT";
}
