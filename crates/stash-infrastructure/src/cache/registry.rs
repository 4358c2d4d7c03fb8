//! Cache registry
//!
//! Decouples declaring a cache from building it. `register` only stores the
//! validated configuration; the engine is constructed on the first `get`, and
//! connects on first use after that. A cache that is declared but never used
//! never opens a connection.
//!
//! The registry is a plain value: construct it once at startup and share it
//! (typically behind an `Arc`) with whatever needs cache lookup.

use super::Cache;
use crate::config::StashConfig;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use stash_domain::error::{Error, Result};
use stash_domain::{CacheConfig, CacheName, CacheOptions};
use std::sync::Arc;
use tracing::{debug, info};

/// Directory of declared caches and their lazily built instances
#[derive(Debug, Default)]
pub struct CacheRegistry {
    configs: DashMap<CacheName, CacheConfig>,
    instances: DashMap<CacheName, Arc<Cache>>,
}

impl CacheRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every cache declared in `config`
    pub fn from_config(config: &StashConfig) -> Result<Self> {
        let registry = Self::new();
        for (name, options) in &config.caches {
            registry.register(name, options)?;
        }
        Ok(registry)
    }

    /// Declare a cache.
    ///
    /// Re-declaring a name with an identical configuration is a no-op; a
    /// different configuration fails with [`Error::Duplicate`].
    pub fn register(&self, name: &str, options: &CacheOptions) -> Result<()> {
        let name = CacheName::new(name)?;
        let config = options.resolve(&name)?;
        self.register_config(name, config)
    }

    /// Declare a cache from an already resolved configuration
    pub fn register_config(&self, name: CacheName, config: CacheConfig) -> Result<()> {
        stash_providers::cache::ensure_supported(&name, config.kind())?;
        match self.configs.entry(name) {
            Entry::Occupied(existing) => {
                if existing.get() == &config {
                    debug!(instance = %existing.key(), "identical re-registration ignored");
                    Ok(())
                } else {
                    Err(Error::duplicate(existing.key().as_str(), config.kind()))
                }
            }
            Entry::Vacant(slot) => {
                info!(
                    instance = %slot.key(),
                    engine = %config.kind(),
                    default_expiry = config.default_expiry(),
                    "cache registered"
                );
                slot.insert(config);
                Ok(())
            }
        }
    }

    /// The cache registered under `name`, built on first request
    pub fn get(&self, name: &str) -> Result<Arc<Cache>> {
        let name = CacheName::new(name).map_err(|_| Error::not_found(name.trim()))?;

        if let Some(cache) = self.instances.get(&name) {
            return Ok(Arc::clone(cache.value()));
        }

        let config = self
            .configs
            .get(&name)
            .map(|config| config.value().clone())
            .ok_or_else(|| Error::not_found(name.as_str()))?;

        match self.instances.entry(name) {
            Entry::Occupied(existing) => Ok(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                let cache = Arc::new(Cache::new(slot.key().clone(), config)?);
                debug!(instance = %slot.key(), engine = %cache.engine_kind(), "cache materialized");
                slot.insert(Arc::clone(&cache));
                Ok(cache)
            }
        }
    }

    /// Whether a cache is declared under `name`, built or not
    pub fn has(&self, name: &str) -> bool {
        CacheName::new(name).is_ok_and(|name| self.configs.contains_key(&name))
    }

    /// Whether the cache under `name` has been built
    pub fn is_materialized(&self, name: &str) -> bool {
        CacheName::new(name).is_ok_and(|name| self.instances.contains_key(&name))
    }

    /// Declared names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .configs
            .iter()
            .map(|entry| entry.key().as_str().to_string())
            .collect();
        names.sort();
        names
    }

    /// Declared configuration for `name`
    pub fn config(&self, name: &str) -> Option<CacheConfig> {
        let name = CacheName::new(name).ok()?;
        self.configs.get(&name).map(|config| config.value().clone())
    }

    /// Finalize every built cache, returning the first failure
    pub async fn finalize_all(&self) -> Result<()> {
        let caches: Vec<Arc<Cache>> = self
            .instances
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut first_error = None;
        for cache in caches {
            if let Err(e) = cache.finalize().await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
