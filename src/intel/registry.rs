// src/intel/registry.rs
//! Source registry: ordered map from source id to its collection capability.
//!
//! Built once at startup and handed to the orchestrator, which never mutates
//! it afterwards. Iteration order is registration order; the orchestrator runs
//! sources in that order.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{IntelError, IntelResult};
use crate::intel::types::{Reading, SourceDescriptor};

/// A single-method collection capability.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    async fn collect(&self) -> Result<Reading>;
}

/// Adapts a plain closure into a [`Collector`]. Handy for tests and for
/// sources whose reading is computed synchronously.
pub struct FnCollector<F> {
    f: F,
}

impl<F> FnCollector<F>
where
    F: Fn() -> Result<Reading> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F> Collector for FnCollector<F>
where
    F: Fn() -> Result<Reading> + Send + Sync,
{
    async fn collect(&self) -> Result<Reading> {
        (self.f)()
    }
}

#[derive(Clone)]
pub struct RegisteredSource {
    pub descriptor: SourceDescriptor,
    pub ttl: Duration,
    pub collector: Arc<dyn Collector>,
}

impl std::fmt::Debug for RegisteredSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredSource")
            .field("descriptor", &self.descriptor)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub struct SourceRegistry {
    sources: Vec<RegisteredSource>,
    index: HashMap<String, usize>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: SourceDescriptor,
        ttl: Duration,
        collector: Arc<dyn Collector>,
    ) -> IntelResult<()> {
        if self.index.contains_key(&descriptor.id) {
            return Err(IntelError::DuplicateSource(descriptor.id));
        }
        self.index.insert(descriptor.id.clone(), self.sources.len());
        self.sources.push(RegisteredSource {
            descriptor,
            ttl,
            collector,
        });
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> IntelResult<&RegisteredSource> {
        self.index
            .get(id)
            .map(|&i| &self.sources[i])
            .ok_or_else(|| IntelError::UnknownSource(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredSource> {
        self.sources.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.descriptor.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
