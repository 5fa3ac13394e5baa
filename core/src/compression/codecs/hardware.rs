//! codecs/hardware.rs
//! Hardware DEFLATE codec over the shared job pool.
//!
//! Design notes:
//! - Every call leases one slot; the lease guard releases it on every exit
//!   path. Asynchronous submissions detach the lease and the slot is released
//!   by `drain` (or by `Drop` for stragglers).
//! - Failures are reported as `HardwareError` and logged here; callers are
//!   expected to retry in software.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{info, warn};

use crate::accelerator::{Accelerator, AcceleratorError, JobPoll, JobRequest};
use crate::compression::types::HardwareError;
use crate::pool::{JobHandle, JobLease, JobPool};

/// An asynchronous decompression submitted but not yet drained.
#[derive(Debug)]
pub struct PendingDecompress<'buf> {
    pub source: &'buf [u8],
    pub dest: &'buf mut [u8],
}

/// A refused asynchronous submission; hands the destination back.
#[derive(Debug)]
pub struct Rejected<'buf> {
    pub error: HardwareError,
    pub dest: &'buf mut [u8],
}

pub struct HardwareCodec<'buf, A: Accelerator> {
    pool: Arc<JobPool<A>>,
    in_flight: BTreeMap<JobHandle, PendingDecompress<'buf>>,
}

impl<'buf, A: Accelerator> HardwareCodec<'buf, A> {
    pub fn new(pool: Arc<JobPool<A>>) -> Self {
        Self { pool, in_flight: BTreeMap::new() }
    }

    pub fn pool(&self) -> &Arc<JobPool<A>> {
        &self.pool
    }

    /// Asynchronous jobs submitted and not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn compress(&self, source: &[u8], dest: &mut [u8]) -> Result<usize, HardwareError> {
        let lease = lease_slot(&self.pool, "compress")?;
        let wait = self.pool.wait();
        let result = lease
            .with_job(|accel, job| {
                let total_out = accel.execute(job, JobRequest::compress(source, dest.len()), wait)?;
                copy_output(accel.output(job), total_out, dest)
            })
            .unwrap_or(Err(HardwareError::InvalidHandle));
        result.map_err(|e| log_failure("compress", e))
    }

    /// Submit and busy-poll until done. `dest.len()` is the expected size.
    pub fn decompress_sync(&self, source: &[u8], dest: &mut [u8]) -> Result<usize, HardwareError> {
        let lease = lease_slot(&self.pool, "decompress_sync")?;
        let wait = self.pool.wait();
        let result = lease
            .with_job(|accel, job| {
                let total_out = accel.execute(job, JobRequest::decompress(source, dest.len()), wait)?;
                copy_exact(accel.output(job), total_out, dest)
            })
            .unwrap_or(Err(HardwareError::InvalidHandle));
        result.map_err(|e| log_failure("decompress_sync", e))
    }

    /// Submit without waiting. `dest` is undefined until `drain` returns.
    pub fn decompress_async(
        &mut self,
        source: &'buf [u8],
        dest: &'buf mut [u8],
    ) -> Result<JobHandle, Rejected<'buf>> {
        let lease = match lease_slot(&self.pool, "decompress_async") {
            Ok(lease) => lease,
            Err(error) => return Err(Rejected { error, dest }),
        };

        let capacity = dest.len();
        let submitted = lease
            .with_job(|accel, job| accel.submit(job, JobRequest::decompress(source, capacity)))
            .ok_or(HardwareError::InvalidHandle)
            .and_then(|r| r.map_err(HardwareError::from));

        match submitted {
            Ok(()) => {
                let handle = lease.detach();
                self.in_flight.insert(handle, PendingDecompress { source, dest });
                Ok(handle)
            }
            Err(error) => {
                drop(lease);
                Err(Rejected { error: log_failure("decompress_async", error), dest })
            }
        }
    }

    /// Block until every in-flight job has completed and its slot is free.
    ///
    /// Jobs the device finished with an error are returned so the caller can
    /// redo them in software.
    pub fn drain(&mut self) -> Vec<PendingDecompress<'buf>> {
        let mut failed = Vec::new();

        while !self.in_flight.is_empty() {
            let mut finished = Vec::new();
            for (&handle, pending) in self.in_flight.iter_mut() {
                let polled = self
                    .pool
                    .with_job(handle, |accel, job| match accel.check(job) {
                        Ok(JobPoll::BeingProcessed) => None,
                        Ok(JobPoll::Completed(total_out)) => {
                            Some(copy_exact(accel.output(job), total_out, pending.dest))
                        }
                        Err(e) => Some(Err(HardwareError::from(e))),
                    })
                    .unwrap_or(Some(Err(HardwareError::InvalidHandle)));

                if let Some(outcome) = polled {
                    finished.push((handle, outcome));
                }
            }

            for (handle, outcome) in finished {
                if let Some(pending) = self.in_flight.remove(&handle) {
                    self.pool.release(handle);
                    if let Err(e) = outcome {
                        log_failure("drain", e);
                        failed.push(pending);
                    }
                }
            }

            if !self.in_flight.is_empty() {
                self.pool.wait().pause();
            }
        }

        failed
    }
}

impl<A: Accelerator> Drop for HardwareCodec<'_, A> {
    fn drop(&mut self) {
        if self.in_flight.is_empty() {
            return;
        }
        warn!(
            "hardware codec dropped with {} un-drained jobs, releasing their slots",
            self.in_flight.len()
        );
        for &handle in self.in_flight.keys() {
            self.pool.release(handle);
        }
        self.in_flight.clear();
    }
}

fn lease_slot<'p, A: Accelerator>(pool: &'p JobPool<A>, op: &str) -> Result<JobLease<'p, A>, HardwareError> {
    if !pool.is_ready() {
        return Err(HardwareError::PoolNotReady);
    }
    pool.lease().ok_or_else(|| {
        info!("DEFLATE hardware {op}: slot acquisition failed (job pool exhausted), falling back to software");
        HardwareError::PoolExhausted
    })
}

fn log_failure(op: &str, e: HardwareError) -> HardwareError {
    warn!("DEFLATE hardware {op} failed, falling back to software: {e}");
    e
}

fn copy_output(output: &[u8], total_out: usize, dest: &mut [u8]) -> Result<usize, HardwareError> {
    let produced = output
        .get(..total_out)
        .ok_or_else(|| AcceleratorError::Job("reported size exceeds staged output".into()))?;
    let capacity = dest.len();
    let target = dest
        .get_mut(..produced.len())
        .ok_or(AcceleratorError::DestinationTooSmall { capacity })?;
    target.copy_from_slice(produced);
    Ok(produced.len())
}

/// Like `copy_output`, but the output must fill `dest` exactly.
fn copy_exact(output: &[u8], total_out: usize, dest: &mut [u8]) -> Result<usize, HardwareError> {
    if total_out != dest.len() {
        return Err(HardwareError::SizeMismatch { expected: dest.len(), actual: total_out });
    }
    copy_output(output, total_out, dest)
}
