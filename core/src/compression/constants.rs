//! compression/constants.rs
//! Stable method bytes and the compressed-size bound.
use std::fmt;

use num_enum::TryFromPrimitive;

use crate::constants::{BOUND_OVERHEAD, METHOD_BYTE_DEFLATE_QPL};

/// Method bytes written into compressed block headers.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum CompressionMethodByte {
    DeflateQpl = METHOD_BYTE_DEFLATE_QPL,
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// Worst-case compressed size of `n` input bytes (zlib `compressBound`).
/// Both paths compress into a destination of at most this size.
#[inline]
pub const fn max_compressed_size(n: usize) -> usize {
    n.saturating_add(n >> 12)
        .saturating_add(n >> 14)
        .saturating_add(n >> 25)
        .saturating_add(BOUND_OVERHEAD)
}
