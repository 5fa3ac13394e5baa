//! compression/registry.rs
//! Codec registry: persisted method byte or name to codec factory.

use std::collections::HashMap;
use std::sync::Arc;

use crate::accelerator::Accelerator;
use crate::compression::codecs::accel::DeflateAccelCodec;
use crate::compression::constants::{enum_name_or_hex, CompressionMethodByte};
use crate::compression::types::CompressionCodec;
use crate::constants::{CODEC_NAME_DEFLATE_QPL, METHOD_BYTE_DEFLATE_QPL};
use crate::pool::{self, JobPool};
use crate::types::CodecError;

/// Builds fresh codec instances. One codec per consumer; factories are shared.
pub trait CodecFactory: Send + Sync {
    fn method_byte(&self) -> u8;

    fn name(&self) -> &'static str;

    fn create(&self) -> Box<dyn CompressionCodec>;
}

/// Produces `DeflateAccelCodec`s bound to one job pool.
pub struct DeflateAccelFactory<A: Accelerator> {
    pool: Arc<JobPool<A>>,
}

impl<A: Accelerator> DeflateAccelFactory<A> {
    pub fn new(pool: Arc<JobPool<A>>) -> Self {
        Self { pool }
    }
}

impl<A: Accelerator> CodecFactory for DeflateAccelFactory<A> {
    fn method_byte(&self) -> u8 {
        METHOD_BYTE_DEFLATE_QPL
    }

    fn name(&self) -> &'static str {
        CODEC_NAME_DEFLATE_QPL
    }

    fn create(&self) -> Box<dyn CompressionCodec> {
        Box::new(DeflateAccelCodec::with_pool(Arc::clone(&self.pool)))
    }
}

#[derive(Default)]
pub struct CodecRegistry {
    by_method: HashMap<u8, Arc<dyn CodecFactory>>,
    by_name: HashMap<&'static str, u8>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `DEFLATE_QPL` installed over the process pool.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_deflate_accel(&mut registry, pool::global());
        registry
    }

    /// Install `factory`, replacing any codec under the same byte or name.
    pub fn register(&mut self, factory: Arc<dyn CodecFactory>) {
        let method = factory.method_byte();
        self.by_name.insert(factory.name(), method);
        self.by_method.insert(method, factory);
    }

    pub fn contains(&self, method_byte: u8) -> bool {
        self.by_method.contains_key(&method_byte)
    }

    pub fn len(&self) -> usize {
        self.by_method.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty()
    }

    /// Resolve the method byte found in a block header.
    pub fn get(&self, method_byte: u8) -> Result<Box<dyn CompressionCodec>, CodecError> {
        self.by_method
            .get(&method_byte)
            .map(|factory| factory.create())
            .ok_or_else(|| CodecError::UnknownMethod(enum_name_or_hex::<CompressionMethodByte>(method_byte)))
    }

    /// Resolve a codec name from a table definition.
    pub fn get_by_name(&self, name: &str) -> Result<Box<dyn CompressionCodec>, CodecError> {
        let method = self
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| CodecError::UnknownName(name.to_string()))?;
        self.get(method)
    }
}

/// Install the accelerated DEFLATE codec over `pool`.
pub fn register_deflate_accel<A: Accelerator>(registry: &mut CodecRegistry, pool: Arc<JobPool<A>>) {
    registry.register(Arc::new(DeflateAccelFactory::new(pool)));
}

