//! Raw DEFLATE (RFC 1951, no zlib/gzip wrapper) via flate2.
//!
//! Both the software codec and the emulated offload engine run through these
//! two routines, so either path decodes what the other produced.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use thiserror::Error;

use crate::accelerator::AcceleratorError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeflateError {
    #[error("output does not fit in {capacity} bytes")]
    OutputTooSmall { capacity: usize },

    #[error("corrupt deflate stream: {0}")]
    Corrupt(String),

    #[error("deflate stream truncated after {consumed} input bytes")]
    Truncated { consumed: usize },

    #[error("deflate engine failed: {0}")]
    Engine(String),
}

impl From<DeflateError> for AcceleratorError {
    fn from(e: DeflateError) -> Self {
        match e {
            DeflateError::OutputTooSmall { capacity } => AcceleratorError::DestinationTooSmall { capacity },
            other => AcceleratorError::Job(other.to_string()),
        }
    }
}

/// New raw-deflate compressor. `dynamic` selects per-block Huffman tables.
pub fn new_deflater(dynamic: bool) -> Compress {
    let level = if dynamic { Compression::default() } else { Compression::fast() };
    Compress::new(level, false)
}

pub fn new_inflater() -> Decompress {
    Decompress::new(false)
}

/// Compress `input` as one complete stream into `out`.
/// Returns the number of bytes written.
pub fn deflate_into(engine: &mut Compress, input: &[u8], out: &mut [u8]) -> Result<usize, DeflateError> {
    engine.reset();
    loop {
        let consumed = engine.total_in() as usize;
        let produced = engine.total_out() as usize;
        let status = engine
            .compress(&input[consumed..], &mut out[produced..], FlushCompress::Finish)
            .map_err(|e| DeflateError::Engine(e.to_string()))?;

        let made_progress =
            engine.total_in() as usize != consumed || engine.total_out() as usize != produced;
        match status {
            Status::StreamEnd => return Ok(engine.total_out() as usize),
            _ if engine.total_out() as usize == out.len() || !made_progress => {
                return Err(DeflateError::OutputTooSmall { capacity: out.len() });
            }
            _ => continue,
        }
    }
}

/// Decompress one complete stream from `input` into `out`.
/// Returns the number of bytes written.
pub fn inflate_into(engine: &mut Decompress, input: &[u8], out: &mut [u8]) -> Result<usize, DeflateError> {
    engine.reset(false);
    loop {
        let consumed = engine.total_in() as usize;
        let produced = engine.total_out() as usize;
        let status = match engine.decompress(&input[consumed..], &mut out[produced..], FlushDecompress::None) {
            Ok(status) => status,
            Err(_) if !out.is_empty() && engine.total_out() as usize == out.len() => {
                return Err(DeflateError::OutputTooSmall { capacity: out.len() });
            }
            Err(e) => return Err(DeflateError::Corrupt(e.to_string())),
        };

        if status == Status::StreamEnd {
            return Ok(engine.total_out() as usize);
        }

        if engine.total_out() as usize == out.len() {
            // Output is exactly full; the end-of-block marker may still be pending.
            return finish_on_full_output(engine, input, out.len());
        }

        let made_progress =
            engine.total_in() as usize != consumed || engine.total_out() as usize != produced;
        if !made_progress {
            return Err(DeflateError::Truncated { consumed: engine.total_in() as usize });
        }
    }
}

/// Drive the engine one byte at a time past a full window: any further output
/// means the window was too small.
fn finish_on_full_output(engine: &mut Decompress, input: &[u8], capacity: usize) -> Result<usize, DeflateError> {
    let mut spill = [0u8; 1];
    let before = engine.total_out();
    loop {
        let consumed = engine.total_in() as usize;
        let status = engine
            .decompress(&input[consumed..], &mut spill, FlushDecompress::None)
            .map_err(|e| DeflateError::Corrupt(e.to_string()))?;

        if engine.total_out() != before {
            return Err(DeflateError::OutputTooSmall { capacity });
        }
        if status == Status::StreamEnd {
            return Ok(capacity);
        }
        if engine.total_in() as usize == consumed {
            return Err(DeflateError::Truncated { consumed });
        }
    }
}
