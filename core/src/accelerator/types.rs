//! accelerator/types.rs
//! Job requests, flags and status types shared by every accelerator.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOp {
    Compress,
    Decompress,
}

bitflags! {
    /// Per-job behaviour flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JobFlags: u32 {
        /// First chunk of a stream.
        const FIRST           = 0x0001;
        /// Last chunk of a stream.
        const LAST            = 0x0002;
        /// Build per-job Huffman tables instead of the fixed ones.
        const DYNAMIC_HUFFMAN = 0x0004;
        /// Skip the post-compression verification pass.
        const OMIT_VERIFY     = 0x0008;
    }
}

impl JobFlags {
    /// Whole-buffer compression with dynamic tables and no verification.
    pub const SINGLE_SHOT_COMPRESS: JobFlags = JobFlags::FIRST
        .union(JobFlags::LAST)
        .union(JobFlags::DYNAMIC_HUFFMAN)
        .union(JobFlags::OMIT_VERIFY);

    pub const SINGLE_SHOT_DECOMPRESS: JobFlags = JobFlags::FIRST.union(JobFlags::LAST);

    pub fn is_single_shot(self) -> bool {
        self.contains(JobFlags::FIRST | JobFlags::LAST)
    }
}

/// One operation handed to a job descriptor.
#[derive(Debug, Clone, Copy)]
pub struct JobRequest<'a> {
    pub op: JobOp,
    pub flags: JobFlags,
    pub input: &'a [u8],
    /// Output capacity the job may fill.
    pub available_out: usize,
}

impl<'a> JobRequest<'a> {
    pub fn compress(input: &'a [u8], available_out: usize) -> Self {
        Self { op: JobOp::Compress, flags: JobFlags::SINGLE_SHOT_COMPRESS, input, available_out }
    }

    pub fn decompress(input: &'a [u8], available_out: usize) -> Self {
        Self { op: JobOp::Decompress, flags: JobFlags::SINGLE_SHOT_DECOMPRESS, input, available_out }
    }
}

/// Result of polling a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPoll {
    BeingProcessed,
    /// Finished; carries the number of bytes produced.
    Completed(usize),
}

/// A hardware input queue as reported by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkQueue {
    pub device: u32,
    pub id: u32,
    /// Queue depth; bounds concurrent jobs on this queue.
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcceleratorError {
    #[error("accelerator discovery failed: {0}")]
    Discovery(String),

    #[error("job descriptor initialization failed: {0}")]
    InitJob(String),

    #[error("job submission rejected: {0}")]
    Submit(String),

    #[error("job failed: {0}")]
    Job(String),

    #[error("job output exceeds {capacity} bytes of destination")]
    DestinationTooSmall { capacity: usize },

    #[error("accelerator engine disconnected")]
    Disconnected,

    #[error("job was never submitted")]
    NotSubmitted,
}
