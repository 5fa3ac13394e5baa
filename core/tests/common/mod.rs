//! Shared fixtures: pool builders, sample data and accelerator test doubles.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use deflate_accel::accelerator::{Accelerator, AcceleratorError, EmulatedAccelerator, JobPoll, JobRequest, WorkQueue};
use deflate_accel::config::AccelConfig;
use deflate_accel::pool::JobPool;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pool over the emulated engine with the given queue depths.
pub fn emulated_pool(depths: &[u32]) -> Arc<JobPool<EmulatedAccelerator>> {
    init_logging();
    let config = AccelConfig::with_work_queues(depths.to_vec());
    Arc::new(JobPool::new(EmulatedAccelerator::from_config(&config), &config))
}

/// Same, but with enough probes that acquisition practically never misses a free slot.
pub fn emulated_pool_thorough(depths: &[u32]) -> Arc<JobPool<EmulatedAccelerator>> {
    init_logging();
    let mut config = AccelConfig::with_work_queues(depths.to_vec());
    config.retry_limit = Some(10_000);
    Arc::new(JobPool::new(EmulatedAccelerator::from_config(&config), &config))
}

/// Pool over a test double; capacity comes from the double's own queues.
pub fn pool_of<A: Accelerator>(accel: A) -> Arc<JobPool<A>> {
    init_logging();
    Arc::new(JobPool::new(accel, &AccelConfig::default()))
}

/// Pool over `accel` with a generous probe budget.
pub fn pool_with_retries<A: Accelerator>(accel: A, retries: usize) -> Arc<JobPool<A>> {
    init_logging();
    let config = AccelConfig { retry_limit: Some(retries), ..AccelConfig::default() };
    Arc::new(JobPool::new(accel, &config))
}

/// Compressible text-like payload.
pub fn sample_text(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog; "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Poorly compressible payload (deterministic xorshift).
pub fn sample_noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state & 0xff) as u8
        })
        .collect()
}

pub fn queues(depths: &[u32]) -> Vec<WorkQueue> {
    depths
        .iter()
        .enumerate()
        .map(|(id, &size)| WorkQueue { device: 0, id: id as u32, size })
        .collect()
}

// -----------------------------------------------------------------------------
// Accelerator doubles
// -----------------------------------------------------------------------------

/// Device that is discovered and initializes fine but refuses every submission.
pub struct RejectingAccelerator {
    pub depths: Vec<u32>,
}

impl Accelerator for RejectingAccelerator {
    type Job = ();

    fn work_queues(&self) -> Result<Vec<WorkQueue>, AcceleratorError> {
        Ok(queues(&self.depths))
    }

    fn init_job(&self) -> Result<(), AcceleratorError> {
        Ok(())
    }

    fn fini_job(&self, _job: &mut ()) {}

    fn submit(&self, _job: &mut (), _request: JobRequest<'_>) -> Result<(), AcceleratorError> {
        Err(AcceleratorError::Submit("queue full".into()))
    }

    fn check(&self, _job: &mut ()) -> Result<JobPoll, AcceleratorError> {
        Err(AcceleratorError::NotSubmitted)
    }

    fn output<'j>(&self, _job: &'j ()) -> &'j [u8] {
        &[]
    }
}

/// Device that accepts every job, reports it busy for a few polls, then fails it.
pub struct FaultyAccelerator {
    pub depths: Vec<u32>,
    pub busy_polls: usize,
}

impl Accelerator for FaultyAccelerator {
    type Job = usize;

    fn work_queues(&self) -> Result<Vec<WorkQueue>, AcceleratorError> {
        Ok(queues(&self.depths))
    }

    fn init_job(&self) -> Result<usize, AcceleratorError> {
        Ok(0)
    }

    fn fini_job(&self, _job: &mut usize) {}

    fn submit(&self, job: &mut usize, _request: JobRequest<'_>) -> Result<(), AcceleratorError> {
        *job = self.busy_polls;
        Ok(())
    }

    fn check(&self, job: &mut usize) -> Result<JobPoll, AcceleratorError> {
        if *job > 0 {
            *job -= 1;
            return Ok(JobPoll::BeingProcessed);
        }
        Err(AcceleratorError::Job("engine error 0x1f".into()))
    }

    fn output<'j>(&self, _job: &'j usize) -> &'j [u8] {
        &[]
    }
}

/// Device whose discovery itself fails.
pub struct UndiscoverableAccelerator;

impl Accelerator for UndiscoverableAccelerator {
    type Job = ();

    fn work_queues(&self) -> Result<Vec<WorkQueue>, AcceleratorError> {
        Err(AcceleratorError::Discovery("device node missing".into()))
    }

    fn init_job(&self) -> Result<(), AcceleratorError> {
        Ok(())
    }

    fn fini_job(&self, _job: &mut ()) {}

    fn submit(&self, _job: &mut (), _request: JobRequest<'_>) -> Result<(), AcceleratorError> {
        Err(AcceleratorError::Disconnected)
    }

    fn check(&self, _job: &mut ()) -> Result<JobPoll, AcceleratorError> {
        Err(AcceleratorError::NotSubmitted)
    }

    fn output<'j>(&self, _job: &'j ()) -> &'j [u8] {
        &[]
    }
}

/// Counts descriptor lifecycle calls. `init_job` fails once `fail_after`
/// descriptors have been built.
pub struct CountingAccelerator {
    pub depths: Vec<u32>,
    pub fail_after: Option<usize>,
    pub inits: AtomicUsize,
    pub finis: AtomicUsize,
}

impl CountingAccelerator {
    pub fn new(depths: &[u32], fail_after: Option<usize>) -> Self {
        Self {
            depths: depths.to_vec(),
            fail_after,
            inits: AtomicUsize::new(0),
            finis: AtomicUsize::new(0),
        }
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn finis(&self) -> usize {
        self.finis.load(Ordering::SeqCst)
    }
}

impl Accelerator for CountingAccelerator {
    type Job = ();

    fn work_queues(&self) -> Result<Vec<WorkQueue>, AcceleratorError> {
        Ok(queues(&self.depths))
    }

    fn init_job(&self) -> Result<(), AcceleratorError> {
        if let Some(limit) = self.fail_after {
            if self.inits() >= limit {
                return Err(AcceleratorError::InitJob("out of portal memory".into()));
            }
        }
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn fini_job(&self, _job: &mut ()) {
        self.finis.fetch_add(1, Ordering::SeqCst);
    }

    fn submit(&self, _job: &mut (), _request: JobRequest<'_>) -> Result<(), AcceleratorError> {
        Ok(())
    }

    fn check(&self, _job: &mut ()) -> Result<JobPoll, AcceleratorError> {
        Ok(JobPoll::Completed(0))
    }

    fn output<'j>(&self, _job: &'j ()) -> &'j [u8] {
        &[]
    }
}
