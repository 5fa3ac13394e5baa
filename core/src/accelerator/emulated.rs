//! accelerator/emulated.rs
//! Host-side offload engine.
//!
//! Design notes:
//! - One engine thread per work queue (capped at the CPU count), fed through a
//!   shared crossbeam channel.
//! - Each descriptor owns a private input/output pair (the "device buffers").
//!   Submission copies the input in; completion stages the output for the
//!   caller to copy out, so asynchrony never touches caller memory.
//! - Dropping the accelerator closes the channel and joins every engine.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use flate2::{Compress, Decompress};
use log::{debug, warn};

use crate::accelerator::{Accelerator, AcceleratorError, JobFlags, JobOp, JobPoll, JobRequest, WorkQueue};
use crate::compression::codecs::deflate::{deflate_into, inflate_into, new_deflater, new_inflater, DeflateError};
use crate::config::AccelConfig;

type JobOutcome = Result<Vec<u8>, AcceleratorError>;

struct EngineTask {
    op: JobOp,
    flags: JobFlags,
    input: Vec<u8>,
    available_out: usize,
    reply: Sender<JobOutcome>,
}

/// Job descriptor for the emulated engine.
#[derive(Debug, Default)]
pub struct EmulatedJob {
    pending: Option<Receiver<JobOutcome>>,
    output: Vec<u8>,
}

impl EmulatedJob {
    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }
}

pub struct EmulatedAccelerator {
    queues: Vec<WorkQueue>,
    injector: Option<Sender<EngineTask>>,
    engines: Vec<JoinHandle<()>>,
}

impl EmulatedAccelerator {
    /// Start one engine per queue depth in `depths`. No depths, no engines.
    pub fn new(depths: &[u32]) -> Self {
        let queues: Vec<WorkQueue> = depths
            .iter()
            .enumerate()
            .map(|(id, &size)| WorkQueue { device: 0, id: id as u32, size })
            .collect();

        let engine_count = queues.iter().filter(|wq| wq.size > 0).count().min(num_cpus::get());
        if engine_count == 0 {
            return Self { queues, injector: None, engines: Vec::new() };
        }

        let (injector, rx) = channel::unbounded::<EngineTask>();
        let mut engines = Vec::with_capacity(engine_count);
        for i in 0..engine_count {
            let rx = rx.clone();
            let spawned = thread::Builder::new()
                .name(format!("deflate-engine-{i}"))
                .spawn(move || run_engine(rx));
            match spawned {
                Ok(handle) => engines.push(handle),
                Err(e) => warn!("failed to start deflate engine {i}: {e}"),
            }
        }

        if engines.is_empty() {
            return Self { queues: Vec::new(), injector: None, engines };
        }
        debug!("emulated accelerator started with {} engines", engines.len());
        Self { queues, injector: Some(injector), engines }
    }

    pub fn from_config(config: &AccelConfig) -> Self {
        Self::new(&config.work_queues)
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }
}

impl Accelerator for EmulatedAccelerator {
    type Job = EmulatedJob;

    fn work_queues(&self) -> Result<Vec<WorkQueue>, AcceleratorError> {
        if self.injector.is_none() {
            return Ok(Vec::new());
        }
        Ok(self.queues.clone())
    }

    fn init_job(&self) -> Result<EmulatedJob, AcceleratorError> {
        if self.injector.is_none() {
            return Err(AcceleratorError::InitJob("no engine running".into()));
        }
        Ok(EmulatedJob::default())
    }

    fn fini_job(&self, job: &mut EmulatedJob) {
        job.pending = None;
        job.output = Vec::new();
    }

    fn submit(&self, job: &mut EmulatedJob, request: JobRequest<'_>) -> Result<(), AcceleratorError> {
        // A descriptor released while still running keeps its receiver.
        // Reuse is only allowed once that stale job has left the engine.
        if let Some(stale) = &job.pending {
            match stale.try_recv() {
                Err(TryRecvError::Empty) => {
                    return Err(AcceleratorError::Submit("descriptor still busy".into()));
                }
                _ => job.pending = None,
            }
        }

        let injector = self.injector.as_ref().ok_or(AcceleratorError::Disconnected)?;
        let (reply, pending) = channel::bounded(1);
        let task = EngineTask {
            op: request.op,
            flags: request.flags,
            input: request.input.to_vec(),
            available_out: request.available_out,
            reply,
        };
        injector.send(task).map_err(|_| AcceleratorError::Disconnected)?;

        job.output.clear();
        job.pending = Some(pending);
        Ok(())
    }

    fn check(&self, job: &mut EmulatedJob) -> Result<JobPoll, AcceleratorError> {
        let pending = job.pending.as_ref().ok_or(AcceleratorError::NotSubmitted)?;
        let outcome = match pending.try_recv() {
            Err(TryRecvError::Empty) => return Ok(JobPoll::BeingProcessed),
            Err(TryRecvError::Disconnected) => Err(AcceleratorError::Disconnected),
            Ok(outcome) => outcome,
        };
        job.pending = None;

        let output = outcome?;
        job.output = output;
        Ok(JobPoll::Completed(job.output.len()))
    }

    fn output<'j>(&self, job: &'j EmulatedJob) -> &'j [u8] {
        &job.output
    }
}

impl Drop for EmulatedAccelerator {
    fn drop(&mut self) {
        // Closing the injector ends every engine loop.
        self.injector = None;
        for engine in self.engines.drain(..) {
            if engine.join().is_err() {
                warn!("deflate engine panicked during shutdown");
            }
        }
    }
}

struct Engine {
    dynamic: Compress,
    fixed: Compress,
    inflater: Decompress,
}

impl Engine {
    fn new() -> Self {
        Self { dynamic: new_deflater(true), fixed: new_deflater(false), inflater: new_inflater() }
    }

    fn run(&mut self, task: &EngineTask) -> JobOutcome {
        if !task.flags.is_single_shot() {
            return Err(AcceleratorError::Job("only single-shot jobs are supported".into()));
        }

        let mut out = vec![0u8; task.available_out];
        let produced = match task.op {
            JobOp::Compress => {
                let deflater = if task.flags.contains(JobFlags::DYNAMIC_HUFFMAN) {
                    &mut self.dynamic
                } else {
                    &mut self.fixed
                };
                let produced = deflate_into(deflater, &task.input, &mut out)?;
                if !task.flags.contains(JobFlags::OMIT_VERIFY) {
                    self.verify(&task.input, &out[..produced])?;
                }
                produced
            }
            JobOp::Decompress => inflate_into(&mut self.inflater, &task.input, &mut out)?,
        };
        out.truncate(produced);
        Ok(out)
    }

    fn verify(&mut self, original: &[u8], compressed: &[u8]) -> Result<(), AcceleratorError> {
        let mut scratch = vec![0u8; original.len()];
        let restored = inflate_into(&mut self.inflater, compressed, &mut scratch)?;
        if scratch[..restored] != *original {
            return Err(DeflateError::Corrupt("verification mismatch".into()).into());
        }
        Ok(())
    }
}

fn run_engine(rx: Receiver<EngineTask>) {
    let mut engine = Engine::new();
    while let Ok(task) = rx.recv() {
        let outcome = engine.run(&task);
        // The submitter may have been torn down; nothing left to notify.
        let _ = task.reply.send(outcome);
    }
}
