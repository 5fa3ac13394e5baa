//! compression/mod.rs
//! Hardware-accelerated DEFLATE codec with transparent software fallback.
//!
//! Industry notes:
//! - The compressed format is raw DEFLATE on both paths, so blocks written by
//!   one path are always readable by the other.
//! - Callers only ever see software-path errors.
//! - The registry resolves the persisted method byte and name to a codec.

pub mod constants;
pub mod types;
pub mod registry;
pub mod codecs;

pub use constants::*;
pub use types::*;
pub use registry::*;
pub use codecs::{DecompressBatch, DeflateAccelCodec, DeflateError, HardwareCodec, SoftwareCodec};
