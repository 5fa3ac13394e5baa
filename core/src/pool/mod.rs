//! pool/mod.rs
//! Process-scoped hardware job pool.
//!
//! Pools are ordinary values shared through `Arc`, so tests build isolated
//! instances. The process pool is created lazily on first use from
//! `AccelConfig::from_env()`; `shutdown_global` is the process-exit hook.

pub mod arena;
pub mod handle;
pub mod job_pool;

use std::sync::{Arc, OnceLock};

pub use arena::JobArena;
pub use handle::JobHandle;
pub use job_pool::{JobLease, JobPool};

use crate::accelerator::EmulatedAccelerator;
use crate::config::AccelConfig;

static GLOBAL_POOL: OnceLock<Arc<JobPool<EmulatedAccelerator>>> = OnceLock::new();

/// The process-wide pool, constructed on first access.
pub fn global() -> Arc<JobPool<EmulatedAccelerator>> {
    GLOBAL_POOL
        .get_or_init(|| {
            let config = AccelConfig::from_env();
            Arc::new(JobPool::new(EmulatedAccelerator::from_config(&config), &config))
        })
        .clone()
}

/// Run the shutdown barrier on the process pool, if it was ever created.
/// Statics are never dropped, so the host calls this at exit.
pub fn shutdown_global() {
    if let Some(pool) = GLOBAL_POOL.get() {
        pool.shutdown();
    }
}
