//! telemetry/mod.rs
//! Path counters and immutable snapshots for the DEFLATE dispatcher.
//!
//! Industry notes:
//! - The fallback ratio is the health signal for an offload device: a rising
//!   ratio means exhausted queues or a failing engine.
//! - Snapshots are plain serde structs so hosts can ship them as JSON.

pub mod counters;
pub mod snapshot;

pub use counters::*;
pub use snapshot::*;
