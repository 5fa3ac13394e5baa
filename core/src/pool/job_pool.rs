//! pool/job_pool.rs
//! Hardware job pool: a fixed arena of accelerator descriptors with lock-free,
//! per-slot acquisition.
//!
//! Design notes:
//! - No pool-wide lock. Each slot has its own atomic flag claimed by CAS.
//! - Acquisition probes random slots and gives up after a bounded number of
//!   attempts. It can miss free slots under contention; callers fall back to
//!   software instead of waiting.
//! - Shutdown claims every slot before finalizing its descriptor, so no job is
//!   in flight when device resources go away.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use rand::Rng;

use crate::accelerator::{discover_capacity, Accelerator, AcceleratorError, WaitStrategy};
use crate::config::AccelConfig;
use crate::pool::arena::JobArena;
use crate::pool::handle::JobHandle;

pub struct JobPool<A: Accelerator> {
    accel: A,
    arena: JobArena<A::Job>,
    locks: Box<[AtomicBool]>,
    ready: AtomicBool,
    shut_down: AtomicBool,
    retry_limit: usize,
    wait: Box<dyn WaitStrategy>,
}

impl<A: Accelerator> JobPool<A> {
    /// Discover capacity and initialize one descriptor per slot.
    ///
    /// Never fails: zero capacity or a descriptor init error leaves the pool
    /// permanently not ready.
    pub fn new(accel: A, config: &AccelConfig) -> Self {
        let wait = config.wait_strategy();

        let slot_count = discover_capacity(&accel);
        if slot_count == 0 {
            return Self::not_ready(accel, wait);
        }

        let jobs = match init_descriptors(&accel, slot_count) {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(
                    "hardware-assisted DEFLATE unavailable, falling back to software codec \
                     (descriptor init failed: {e})"
                );
                return Self::not_ready(accel, wait);
            }
        };

        let retry_limit = config.retry_limit.unwrap_or(slot_count).max(1);
        debug!("hardware-assisted DEFLATE ready: {slot_count} job slots, {retry_limit} probes per acquire");

        Self {
            accel,
            arena: JobArena::new(jobs),
            locks: (0..slot_count).map(|_| AtomicBool::new(false)).collect(),
            ready: AtomicBool::new(true),
            shut_down: AtomicBool::new(false),
            retry_limit,
            wait,
        }
    }

    fn not_ready(accel: A, wait: Box<dyn WaitStrategy>) -> Self {
        Self {
            accel,
            arena: JobArena::empty(),
            locks: Box::new([]),
            ready: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            retry_limit: 0,
            wait,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Number of job slots.
    pub fn capacity(&self) -> usize {
        self.locks.len()
    }

    /// Slots currently locked. Diagnostic only; racy by nature.
    pub fn held(&self) -> usize {
        self.locks.iter().filter(|l| l.load(Ordering::Acquire)).count()
    }

    pub fn retry_limit(&self) -> usize {
        self.retry_limit
    }

    pub fn wait(&self) -> &dyn WaitStrategy {
        self.wait.as_ref()
    }

    pub fn accelerator(&self) -> &A {
        &self.accel
    }

    /// Claim a random free slot, or `None` after `retry_limit` failed probes.
    pub fn acquire(&self) -> Option<JobHandle> {
        if !self.is_ready() {
            return None;
        }
        let slot_count = self.locks.len();
        let mut rng = rand::thread_rng();
        for _ in 0..self.retry_limit {
            let index = rng.gen_range(0..slot_count);
            if self.try_lock(index) {
                return JobHandle::from_index(index, slot_count);
            }
        }
        None
    }

    /// Claim a slot wrapped in a guard that releases it on drop.
    pub fn lease(&self) -> Option<JobLease<'_, A>> {
        self.acquire().map(|handle| JobLease { pool: self, handle, armed: true })
    }

    /// Unlock the slot behind `handle`. Exactly once per successful acquire.
    pub fn release(&self, handle: JobHandle) {
        if let Some(index) = handle.index(self.locks.len()) {
            self.locks[index].store(false, Ordering::Release);
        }
    }

    /// Run `f` against the descriptor behind `handle`.
    /// `None` if the handle does not address a slot of this pool.
    pub fn with_job<R>(&self, handle: JobHandle, f: impl FnOnce(&A, &mut A::Job) -> R) -> Option<R> {
        let index = handle.index(self.locks.len())?;
        let mut job = self.arena.slot(index)?;
        Some(f(&self.accel, &mut *job))
    }

    /// Shutdown barrier. Waits for every slot, finalizes its descriptor and
    /// leaves it locked; the pool is never ready again. Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.ready.store(false, Ordering::Release);

        for index in 0..self.locks.len() {
            while !self.try_lock(index) {
                self.wait.pause();
            }
            if let Some(mut job) = self.arena.slot(index) {
                self.accel.fini_job(&mut job);
            }
        }
        if !self.arena.is_empty() {
            debug!("hardware job pool shut down ({} slots finalized)", self.arena.len());
        }
    }

    #[inline]
    fn try_lock(&self, index: usize) -> bool {
        self.locks[index]
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }
}

impl<A: Accelerator> Drop for JobPool<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Initialize `count` descriptors; on failure finalize the ones already built.
fn init_descriptors<A: Accelerator>(accel: &A, count: usize) -> Result<Vec<A::Job>, AcceleratorError> {
    let mut jobs = Vec::with_capacity(count);
    for _ in 0..count {
        match accel.init_job() {
            Ok(job) => jobs.push(job),
            Err(e) => {
                for job in jobs.iter_mut() {
                    accel.fini_job(job);
                }
                return Err(e);
            }
        }
    }
    Ok(jobs)
}

/// A held slot. Releases on drop unless detached.
pub struct JobLease<'p, A: Accelerator> {
    pool: &'p JobPool<A>,
    handle: JobHandle,
    armed: bool,
}

impl<'p, A: Accelerator> JobLease<'p, A> {
    pub fn handle(&self) -> JobHandle {
        self.handle
    }

    pub fn with_job<R>(&self, f: impl FnOnce(&A, &mut A::Job) -> R) -> Option<R> {
        self.pool.with_job(self.handle, f)
    }

    /// Keep the slot locked past this guard. The caller now owns the release.
    pub fn detach(mut self) -> JobHandle {
        self.armed = false;
        self.handle
    }
}

impl<A: Accelerator> Drop for JobLease<'_, A> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.release(self.handle);
        }
    }
}
