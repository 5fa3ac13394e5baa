//! deflate-accel
//!
//! DEFLATE block codec that offloads work to a hardware accelerator and falls
//! back to software whenever the device is absent, busy or failing.
//! No FFI, no unsafe.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;

// Device seam and job pool
pub mod accelerator;
pub mod pool;

// Codecs
pub mod compression;
pub mod telemetry;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::accelerator::{Accelerator, EmulatedAccelerator, NullAccelerator, WaitKind};
    pub use crate::compression::{
        max_compressed_size, register_deflate_accel, CodecRegistry, CompressionCodec, DecompressBatch,
        DecompressMode, DeflateAccelCodec,
    };
    pub use crate::config::AccelConfig;
    pub use crate::pool::{JobHandle, JobPool};
    pub use crate::telemetry::CodecSnapshot;
    pub use crate::types::{CodecError, Result};
}
