//! config.rs
//! Accelerator configuration.
//!
//! Design notes:
//! - Every field has a default so partial JSON documents are accepted.
//! - Environment loading never fails: malformed values are logged and ignored,
//!   leaving the codec in software-only mode at worst.

use std::env;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::accelerator::wait::{SleepWait, SpinPause, WaitKind, WaitStrategy, YieldWait};
use crate::constants::{env as env_keys, DEFAULT_SLEEP_MICROS, DEFAULT_SPIN_ITERATIONS};
use crate::types::CodecError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelConfig {
    /// Depth of each hardware work queue. Empty means no device.
    pub work_queues: Vec<u32>,
    /// How busy-polling threads wait between completion checks.
    pub wait: WaitKind,
    pub spin_iterations: u32,
    pub sleep_micros: u64,
    /// Random probes per acquisition; `None` uses the slot count.
    pub retry_limit: Option<usize>,
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self {
            work_queues: Vec::new(),
            wait: WaitKind::Spin,
            spin_iterations: DEFAULT_SPIN_ITERATIONS,
            sleep_micros: DEFAULT_SLEEP_MICROS,
            retry_limit: None,
        }
    }
}

impl AccelConfig {
    /// Config with the given work-queue depths and default waiting.
    pub fn with_work_queues(work_queues: Vec<u32>) -> Self {
        Self { work_queues, ..Self::default() }
    }

    pub fn from_json(raw: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Build a config from `DEFLATE_ACCEL_*` variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var(env_keys::WORK_QUEUES) {
            match parse_work_queues(&raw) {
                Some(queues) => config.work_queues = queues,
                None => warn!("ignoring malformed {}={:?}", env_keys::WORK_QUEUES, raw),
            }
        }

        if let Ok(raw) = env::var(env_keys::WAIT) {
            match WaitKind::parse(&raw) {
                Some(kind) => config.wait = kind,
                None => warn!("ignoring unknown {}={:?}", env_keys::WAIT, raw),
            }
        }

        if let Ok(raw) = env::var(env_keys::RETRY_LIMIT) {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => config.retry_limit = Some(limit),
                _ => warn!("ignoring malformed {}={:?}", env_keys::RETRY_LIMIT, raw),
            }
        }

        config
    }

    /// Instantiate the configured wait strategy.
    pub fn wait_strategy(&self) -> Box<dyn WaitStrategy> {
        match self.wait {
            WaitKind::Spin => Box::new(SpinPause::new(self.spin_iterations)),
            WaitKind::Yield => Box::new(YieldWait),
            WaitKind::Sleep => Box::new(SleepWait(Duration::from_micros(self.sleep_micros))),
        }
    }
}

fn parse_work_queues(raw: &str) -> Option<Vec<u32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(Vec::new());
    }
    raw.split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect()
}

