//! codecs/accel.rs
//! `DEFLATE_QPL` dispatcher: hardware first, software on any hardware failure.
//!
//! Design notes:
//! - Hardware errors are logged and counted, never returned.
//! - `decompress` borrows its buffers for the call only, so it completes in
//!   every mode; in asynchronous mode it polls the device like synchronous mode.
//! - Deferred decompression goes through `DecompressBatch`. The batch holds
//!   the buffers of its submissions and `flush` is the barrier that hands them
//!   back; it is also the only way back to synchronous mode.
//! - Async jobs the device fails are redone in software during `flush`.

use std::sync::Arc;

use log::warn;

use crate::accelerator::{Accelerator, EmulatedAccelerator};
use crate::compression::codecs::hardware::HardwareCodec;
use crate::compression::codecs::software::SoftwareCodec;
use crate::compression::constants::max_compressed_size;
use crate::compression::types::{CompressionCodec, DecompressMode};
use crate::constants::{CODEC_NAME_DEFLATE_QPL, METHOD_BYTE_DEFLATE_QPL};
use crate::pool::{self, JobPool};
use crate::telemetry::{CodecCounters, CodecSnapshot};
use crate::types::CodecError;

pub struct DeflateAccelCodec<A: Accelerator = EmulatedAccelerator> {
    pool: Arc<JobPool<A>>,
    // Synchronous paths only; its in-flight map stays empty.
    hw: HardwareCodec<'static, A>,
    sw: SoftwareCodec,
    mode: DecompressMode,
    counters: CodecCounters,
}

impl DeflateAccelCodec<EmulatedAccelerator> {
    /// Dispatcher over the process-wide pool.
    pub fn new() -> Self {
        Self::with_pool(pool::global())
    }
}

impl Default for DeflateAccelCodec<EmulatedAccelerator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Accelerator> DeflateAccelCodec<A> {
    pub fn with_pool(pool: Arc<JobPool<A>>) -> Self {
        Self {
            hw: HardwareCodec::new(Arc::clone(&pool)),
            sw: SoftwareCodec::new(),
            pool,
            mode: DecompressMode::Synchronous,
            counters: CodecCounters::default(),
        }
    }

    pub fn decompress_mode(&self) -> DecompressMode {
        self.mode
    }

    pub fn set_decompress_mode(&mut self, mode: DecompressMode) {
        self.mode = mode;
    }

    pub fn counters(&self) -> &CodecCounters {
        &self.counters
    }

    pub fn snapshot(&self) -> CodecSnapshot {
        self.snapshot_with(0)
    }

    fn snapshot_with(&self, pending: usize) -> CodecSnapshot {
        CodecSnapshot::from(&self.counters, self.pool.is_ready(), self.pool.capacity(), self.mode, pending)
    }

    pub fn max_compressed_size(&self, uncompressed: usize) -> usize {
        max_compressed_size(uncompressed)
    }

    /// Compress into at most `max_compressed_size(source.len())` bytes of `dest`.
    pub fn compress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize, CodecError> {
        let limit = max_compressed_size(source.len()).min(dest.len());
        let dest = &mut dest[..limit];

        if self.pool.is_ready() {
            match self.hw.compress(source, dest) {
                Ok(n) => {
                    self.counters.add_compress(true, source.len(), n);
                    return Ok(n);
                }
                Err(_) => self.counters.add_fallback(),
            }
        }

        let n = self.sw.compress(source, dest).map_err(CodecError::Compress)?;
        self.counters.add_compress(false, source.len(), n);
        Ok(n)
    }

    /// Decompress `source` into `dest`; `dest` is complete when this returns.
    pub fn decompress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<(), CodecError> {
        match self.mode {
            DecompressMode::Synchronous | DecompressMode::Asynchronous => {
                if self.pool.is_ready() {
                    match self.hw.decompress_sync(source, dest) {
                        Ok(n) => {
                            self.counters.add_hw_decompress_sync(source.len(), n);
                            return Ok(());
                        }
                        Err(_) => self.counters.add_fallback(),
                    }
                }
                self.software_decompress(source, dest)
            }
            DecompressMode::SoftwareFallback => self.software_decompress(source, dest),
        }
    }

    /// Open a batch of decompressions whose buffers stay borrowed until the
    /// batch is flushed.
    pub fn batch<'buf>(&mut self) -> DecompressBatch<'_, 'buf, A> {
        DecompressBatch { hw: HardwareCodec::new(Arc::clone(&self.pool)), codec: self }
    }

    /// Return to synchronous mode. Pending work lives in batches, so there is
    /// nothing to wait for here.
    pub fn flush(&mut self) -> Result<(), CodecError> {
        self.counters.flushes += 1;
        self.mode = DecompressMode::Synchronous;
        Ok(())
    }

    fn software_decompress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<(), CodecError> {
        let n = self.sw.decompress(source, dest).map_err(CodecError::Decompress)?;
        self.counters.add_sw_decompress(source.len(), n);
        Ok(())
    }
}

/// Decompressions sharing one barrier.
///
/// In asynchronous mode each `decompress` submits to the device and returns
/// at once; its destination is undefined until `flush` returns. In the other
/// modes the call completes immediately, as on the codec.
pub struct DecompressBatch<'c, 'buf, A: Accelerator> {
    codec: &'c mut DeflateAccelCodec<A>,
    hw: HardwareCodec<'buf, A>,
}

impl<'c, 'buf, A: Accelerator> DecompressBatch<'c, 'buf, A> {
    /// Asynchronous decompressions awaiting `flush`.
    pub fn pending(&self) -> usize {
        self.hw.in_flight()
    }

    pub fn counters(&self) -> &CodecCounters {
        &self.codec.counters
    }

    pub fn snapshot(&self) -> CodecSnapshot {
        self.codec.snapshot_with(self.hw.in_flight())
    }

    pub fn decompress(&mut self, source: &'buf [u8], dest: &'buf mut [u8]) -> Result<(), CodecError> {
        let codec = &mut *self.codec;
        if codec.mode != DecompressMode::Asynchronous {
            return codec.decompress(source, dest);
        }
        if !codec.pool.is_ready() {
            return codec.software_decompress(source, dest);
        }

        let expected = dest.len();
        match self.hw.decompress_async(source, dest) {
            Ok(_) => {
                codec.counters.add_hw_decompress_async(source.len(), expected);
                Ok(())
            }
            Err(rejected) => {
                codec.counters.add_fallback();
                codec.software_decompress(source, rejected.dest)
            }
        }
    }

    /// Wait for every submission, redo failed ones in software and return the
    /// codec to synchronous mode. Every destination is valid once this returns.
    pub fn flush(mut self) -> Result<(), CodecError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), CodecError> {
        let mut result = Ok(());
        for failed in self.hw.drain() {
            self.codec.counters.add_fallback();
            if let Err(e) = self.codec.software_decompress(failed.source, failed.dest) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result.and(self.codec.flush())
    }
}

impl<A: Accelerator> Drop for DecompressBatch<'_, '_, A> {
    fn drop(&mut self) {
        if self.hw.in_flight() == 0 {
            return;
        }
        warn!("decompress batch dropped with {} pending jobs, flushing", self.hw.in_flight());
        if let Err(e) = self.finish() {
            warn!("flush on drop failed: {e}");
        }
    }
}

impl<A: Accelerator> CompressionCodec for DeflateAccelCodec<A> {
    fn method_byte(&self) -> u8 {
        METHOD_BYTE_DEFLATE_QPL
    }

    fn name(&self) -> &'static str {
        CODEC_NAME_DEFLATE_QPL
    }

    fn max_compressed_size(&self, uncompressed: usize) -> usize {
        max_compressed_size(uncompressed)
    }

    fn compress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize, CodecError> {
        DeflateAccelCodec::compress(self, source, dest)
    }

    fn decompress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<(), CodecError> {
        DeflateAccelCodec::decompress(self, source, dest)
    }

    fn flush(&mut self) -> Result<(), CodecError> {
        DeflateAccelCodec::flush(self)
    }

    fn decompress_mode(&self) -> DecompressMode {
        self.mode
    }

    fn set_decompress_mode(&mut self, mode: DecompressMode) {
        DeflateAccelCodec::set_decompress_mode(self, mode)
    }
}
