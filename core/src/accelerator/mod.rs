//! accelerator/mod.rs
//! The hardware seam: anything able to run single-shot DEFLATE jobs away
//! from the calling thread.
//!
//! Design notes:
//! - A job descriptor is opaque to the pool; the pool only owns and locks it.
//! - Completion is observed by polling `check`, never by blocking in the device.
//! - Finished output is staged inside the descriptor and read through `output`,
//!   so a running job never aliases caller memory.

pub mod types;
pub mod wait;
pub mod discovery;
pub mod emulated;

pub use types::{AcceleratorError, JobFlags, JobOp, JobPoll, JobRequest, WorkQueue};
pub use wait::{SleepWait, SpinPause, WaitKind, WaitStrategy, YieldWait};
pub use discovery::{discover_capacity, total_depth};
pub use emulated::{EmulatedAccelerator, EmulatedJob};

pub trait Accelerator: Send + Sync + 'static {
    /// Per-slot job descriptor.
    type Job: Send;

    /// Enumerate the hardware work queues. Queried once per pool.
    fn work_queues(&self) -> Result<Vec<WorkQueue>, AcceleratorError>;

    fn init_job(&self) -> Result<Self::Job, AcceleratorError>;

    /// Release device resources held by a descriptor.
    fn fini_job(&self, job: &mut Self::Job);

    /// Non-blocking submission of one operation.
    fn submit(&self, job: &mut Self::Job, request: JobRequest<'_>) -> Result<(), AcceleratorError>;

    fn check(&self, job: &mut Self::Job) -> Result<JobPoll, AcceleratorError>;

    /// Bytes produced by the last completed job.
    fn output<'j>(&self, job: &'j Self::Job) -> &'j [u8];

    /// Submit and poll until the job leaves the device.
    fn execute(
        &self,
        job: &mut Self::Job,
        request: JobRequest<'_>,
        wait: &dyn WaitStrategy,
    ) -> Result<usize, AcceleratorError> {
        self.submit(job, request)?;
        loop {
            match self.check(job)? {
                JobPoll::Completed(total_out) => return Ok(total_out),
                JobPoll::BeingProcessed => wait.pause(),
            }
        }
    }
}

/// A host without the device. Discovery reports no queues.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAccelerator;

impl Accelerator for NullAccelerator {
    type Job = ();

    fn work_queues(&self) -> Result<Vec<WorkQueue>, AcceleratorError> {
        Ok(Vec::new())
    }

    fn init_job(&self) -> Result<(), AcceleratorError> {
        Err(AcceleratorError::InitJob("no accelerator present".into()))
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
