//! compression/types.rs
//! Codec contract, decompression modes and per-path error kinds.
use thiserror::Error;

use crate::accelerator::AcceleratorError;
use crate::compression::codecs::deflate::DeflateError;
use crate::types::CodecError;

/// How the dispatcher services `decompress`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DecompressMode {
    /// Hardware with busy-poll completion, software on failure.
    #[default]
    Synchronous,
    /// Hardware submission without waiting inside a batch; results valid
    /// after the batch's `flush`.
    Asynchronous,
    /// Always software.
    SoftwareFallback,
}

/// Failure on the hardware path. Transient; always absorbed by fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    #[error("hardware job pool not ready")]
    PoolNotReady,

    #[error("hardware job pool exhausted")]
    PoolExhausted,

    #[error("job handle does not address a pool slot")]
    InvalidHandle,

    #[error("hardware produced {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Accelerator(#[from] AcceleratorError),
}

/// Failure on the software path. Fatal for the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoftwareError {
    #[error(transparent)]
    Deflate(#[from] DeflateError),

    #[error("decompressed {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// The four operations a codec registry expects from a codec, plus the
/// decompression mode switch.
///
/// Buffers are borrowed for one call; `dest` is complete when `decompress`
/// returns. Deferred decompression is an inherent API of the codec.
pub trait CompressionCodec: Send {
    fn method_byte(&self) -> u8;

    fn name(&self) -> &'static str;

    /// Upper bound on the compressed size of `uncompressed` bytes.
    fn max_compressed_size(&self, uncompressed: usize) -> usize;

    /// Compress `source` into `dest`, returning the compressed length.
    fn compress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize, CodecError>;

    /// Decompress `source` into `dest`; `dest.len()` is the uncompressed size.
    fn decompress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<(), CodecError>;

    /// Barrier over pending work; resets the mode to `Synchronous`.
    fn flush(&mut self) -> Result<(), CodecError>;

    fn decompress_mode(&self) -> DecompressMode;

    fn set_decompress_mode(&mut self, mode: DecompressMode);
}
