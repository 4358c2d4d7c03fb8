//! Cache contract
//!
//! A [`Cache`] owns one engine and translates caller operations into engine
//! primitives:
//!
//! - caller keys are trimmed, lowercased and prefixed with `"<name>:"`
//! - the engine is initialized on first use
//! - values are wrapped in a [`CacheEntry`] and serialized as JSON
//! - raw engine failures become [`Error::Operation`] with full metadata
//!
//! ## Example
//!
//! ```ignore
//! use stash_domain::{CacheName, CacheOptions, SetOptions};
//! use stash_infrastructure::Cache;
//!
//! let name = CacheName::new("sessions")?;
//! let config = CacheOptions::memory().resolve(&name)?;
//! let cache = Cache::new(name, config)?;
//!
//! cache.set("u1", &serde_json::json!({"id": 1}), SetOptions::new()).await?;
//! let user: Option<serde_json::Value> = cache.get("u1").await?;
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use stash_domain::error::{Error, ErrorMetadata, Operation, Result};
use stash_domain::{
    CacheConfig, CacheEngine, CacheEntry, CacheName, EngineKind, EngineState, SetOptions,
    expiry_in_bounds,
};
use std::sync::Arc;
use tracing::debug;

/// A named cache bound to one configuration and one engine
#[derive(Debug)]
pub struct Cache {
    name: CacheName,
    config: CacheConfig,
    engine: Arc<dyn CacheEngine>,
}

impl Cache {
    /// Build a cache and its (still closed) engine
    pub fn new(name: CacheName, config: CacheConfig) -> Result<Self> {
        let engine = stash_providers::cache::create_engine(&name, config.engine())?;
        Ok(Self::with_engine(name, config, engine))
    }

    /// Build a cache over an existing engine
    pub fn with_engine(name: CacheName, config: CacheConfig, engine: Arc<dyn CacheEngine>) -> Self {
        Self {
            name,
            config,
            engine,
        }
    }

    /// Normalized instance name
    pub fn name(&self) -> &CacheName {
        &self.name
    }

    /// Configuration this cache was built from
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Engine kind
    pub fn engine_kind(&self) -> EngineKind {
        self.engine.kind()
    }

    /// Engine connection state
    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    fn metadata(&self, operation: Operation) -> ErrorMetadata {
        ErrorMetadata::new()
            .engine(self.engine.kind())
            .instance(self.name.as_str())
            .operation(operation)
    }

    fn key_metadata(&self, operation: Operation, key: &str) -> ErrorMetadata {
        self.metadata(operation).key(key)
    }

    /// Connect the engine unless it is already open
    async fn ensure_ready(&self, operation: Operation, key: Option<&str>) -> Result<()> {
        if self.engine.state() == EngineState::Open {
            return Ok(());
        }
        self.engine.init().await.map_err(|e| {
            e.attribute(|| {
                let metadata = self.metadata(operation);
                match key {
                    Some(key) => metadata.key(key),
                    None => metadata,
                }
            })
        })
    }

    /// Connect the engine; idempotent
    pub async fn init(&self) -> Result<()> {
        self.ensure_ready(Operation::Init, None).await
    }

    /// Disconnect the engine; idempotent
    ///
    /// Network engines keep their server-side entries. The memory engine has
    /// nothing to disconnect from, so finalizing it drops every entry it holds
    /// (including other instances sharing it through [`with_engine`](Self::with_engine)).
    /// The same applies to [`CacheRegistry::finalize_all`](crate::cache::CacheRegistry::finalize_all).
    /// A memoized connect failure is cleared, so the next call reconnects.
    pub async fn finalize(&self) -> Result<()> {
        self.engine
            .finalize()
            .await
            .map_err(|e| e.attribute(|| self.metadata(Operation::Finalize)))
    }

    /// Alias for [`finalize`](Self::finalize)
    pub async fn close(&self) -> Result<()> {
        self.finalize().await
    }

    /// Whether a live entry exists at `key`
    pub async fn has(&self, key: &str) -> Result<bool> {
        let key = CacheName::normalize_key(key);
        self.ensure_ready(Operation::Has, Some(&key)).await?;
        self.engine
            .exists(&self.name.namespaced_key(&key))
            .await
            .map_err(|e| e.attribute(|| self.key_metadata(Operation::Has, &key)))
    }

    /// Read the value at `key`.
    ///
    /// A window-mode entry has its expiry renewed, but only once the stored
    /// value decoded successfully as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let key = CacheName::normalize_key(key);
        self.ensure_ready(Operation::Get, Some(&key)).await?;
        let physical = self.name.namespaced_key(&key);

        let Some(payload) = self
            .engine
            .read(&physical)
            .await
            .map_err(|e| e.attribute(|| self.key_metadata(Operation::Get, &key)))?
        else {
            return Ok(None);
        };

        let entry = CacheEntry::decode(&payload).map_err(|e| {
            Error::operation_with_source(
                "stored entry is not a valid cache record",
                self.key_metadata(Operation::Get, &key),
                e,
            )
        })?;
        let renew = entry.renews_on_read().then_some(entry.expiry);
        let value: T = serde_json::from_value(entry.data).map_err(|e| {
            Error::operation_with_source(
                "stored value does not decode as the requested type",
                self.key_metadata(Operation::Get, &key),
                e,
            )
        })?;

        if let Some(expiry) = renew {
            self.engine
                .renew(&physical, &payload, expiry)
                .await
                .map_err(|e| e.attribute(|| self.key_metadata(Operation::Get, &key)))?;
            debug!(instance = %self.name, key = %key, expiry, "window expiry renewed");
        }
        Ok(Some(value))
    }

    /// Store `value` at `key`.
    ///
    /// Expiry falls back to the configured default and must lie in
    /// `[0, 216000]` seconds; window mode defaults to off.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: SetOptions,
    ) -> Result<()> {
        let key = CacheName::normalize_key(key);
        let expiry = match options.expiry {
            None => self.config.default_expiry(),
            Some(requested) => expiry_in_bounds(requested).ok_or_else(|| {
                Error::config(
                    format!("expiry for key '{key}' must lie in [0, 216000] seconds, got {requested}"),
                    self.key_metadata(Operation::Set, &key)
                        .config("expiry", requested),
                )
            })?,
        };

        let data = serde_json::to_value(value).map_err(|e| {
            Error::operation_with_source(
                "value cannot be serialized",
                self.key_metadata(Operation::Set, &key),
                e,
            )
        })?;
        let payload = CacheEntry::new(data, expiry, options.effective_window())
            .encode()
            .map_err(|e| {
                Error::operation_with_source(
                    "entry cannot be serialized",
                    self.key_metadata(Operation::Set, &key),
                    e,
                )
            })?;

        self.ensure_ready(Operation::Set, Some(&key)).await?;
        self.engine
            .write(&self.name.namespaced_key(&key), &payload, expiry)
            .await
            .map_err(|e| e.attribute(|| self.key_metadata(Operation::Set, &key)))
    }

    /// Remove `key`; absent keys are not an error
    pub async fn delete(&self, key: &str) -> Result<()> {
        let key = CacheName::normalize_key(key);
        self.ensure_ready(Operation::Delete, Some(&key)).await?;
        self.engine
            .remove(&self.name.namespaced_key(&key))
            .await
            .map_err(|e| e.attribute(|| self.key_metadata(Operation::Delete, &key)))
    }

    /// Remove every entry in this cache's namespace, returning how many went.
    ///
    /// Not atomic on network engines: a key written concurrently may survive.
    pub async fn clear(&self) -> Result<u64> {
        self.ensure_ready(Operation::Clear, None).await?;
        let removed = self
            .engine
            .clear(&self.name.namespace_prefix())
            .await
            .map_err(|e| e.attribute(|| self.metadata(Operation::Clear)))?;
        debug!(instance = %self.name, removed, "cache cleared");
        Ok(removed)
    }
}
