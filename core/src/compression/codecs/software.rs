//! codecs/software.rs
//! Software DEFLATE fallback.
//!
//! One descriptor (deflater + inflater state) is created on first use and
//! reset in place for every later call. Failures here are final: there is no
//! path below software.

use flate2::{Compress, Decompress};

use crate::compression::codecs::deflate::{deflate_into, inflate_into, new_deflater, new_inflater};
use crate::compression::types::SoftwareError;

struct SoftwareJob {
    deflater: Compress,
    inflater: Decompress,
}

#[derive(Default)]
pub struct SoftwareCodec {
    job: Option<SoftwareJob>,
}

impl SoftwareCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the descriptor has been created yet.
    pub fn is_initialized(&self) -> bool {
        self.job.is_some()
    }

    fn job(&mut self) -> &mut SoftwareJob {
        self.job.get_or_insert_with(|| SoftwareJob {
            deflater: new_deflater(true),
            inflater: new_inflater(),
        })
    }

    pub fn compress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize, SoftwareError> {
        let job = self.job();
        Ok(deflate_into(&mut job.deflater, source, dest)?)
    }

    /// Decompress into all of `dest`; a short stream is an error.
    pub fn decompress(&mut self, source: &[u8], dest: &mut [u8]) -> Result<usize, SoftwareError> {
        let job = self.job();
        let produced = inflate_into(&mut job.inflater, source, dest)?;
        if produced != dest.len() {
            return Err(SoftwareError::SizeMismatch { expected: dest.len(), actual: produced });
        }
        Ok(produced)
    }
}
