//! compression/codecs/mod.rs
//! DEFLATE codec paths.
//!
//! - `deflate`: raw DEFLATE engine shared by every path.
//! - `software`: in-process fallback.
//! - `hardware`: offload through the job pool.
//! - `accel`: the dispatcher combining both.

pub mod deflate;
pub mod software;
pub mod hardware;
pub mod accel;

pub use deflate::DeflateError;
pub use software::SoftwareCodec;
pub use hardware::{HardwareCodec, PendingDecompress, Rejected};
pub use accel::{DecompressBatch, DeflateAccelCodec};
