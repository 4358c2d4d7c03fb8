//! Memcached engine
//!
//! Uses the async-memcached client over the text protocol. The client is not
//! multiplexed, so it sits behind an async mutex and commands are serialized
//! per engine. A command that fails with an I/O error drops the connection;
//! the next call reconnects.
//!
//! Memcached has no way to enumerate keys. The engine therefore keeps a local
//! index of every key it has written, with the deadline the server will expire
//! it at, and clears a namespace by deleting the indexed keys. Keys written by
//! other processes are not seen by `clear`.

use super::lifecycle::Lifecycle;
use crate::constants::{
    MEMCACHED_INDEX_PRUNE_FLOOR, MEMCACHED_MAX_KEY_LENGTH, MEMCACHED_URL_SCHEME,
};
use async_memcached::{AsciiProtocol, Client, MetaProtocol, Status};
use async_trait::async_trait;
use dashmap::DashMap;
use stash_domain::{
    CacheEngine, CacheName, EngineKind, EngineState, Error, MemcachedConfig, Operation, Result,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

type SharedClient = Arc<Mutex<Client>>;

/// Memcached engine
pub struct MemcachedEngine {
    lifecycle: Lifecycle<SharedClient>,
    config: MemcachedConfig,
    /// Written keys and when the server expires them (`None` = never)
    index: DashMap<String, Option<Instant>>,
    prune_at: AtomicUsize,
}

impl MemcachedEngine {
    /// Create a closed engine; nothing connects until first use or `init`
    pub fn new(name: CacheName, config: MemcachedConfig) -> Self {
        Self {
            lifecycle: Lifecycle::new(EngineKind::Memcached, name),
            config,
            index: DashMap::new(),
            prune_at: AtomicUsize::new(MEMCACHED_INDEX_PRUNE_FLOOR),
        }
    }

    /// Address the client connects to
    pub fn server_address(&self) -> String {
        let host = if self.config.host.contains(':') && !self.config.host.starts_with('[') {
            format!("[{}]", self.config.host)
        } else {
            self.config.host.clone()
        };
        format!("{MEMCACHED_URL_SCHEME}://{host}:{}", self.config.port)
    }

    /// Number of keys currently tracked for `clear`
    pub fn indexed_keys(&self) -> usize {
        self.index.len()
    }

    async fn link(&self) -> Result<SharedClient> {
        self.lifecycle.connect(|| self.open()).await
    }

    async fn open(&self) -> Result<SharedClient> {
        let address = self.server_address();
        let timeout = self.config.connect_timeout;

        let client = tokio::time::timeout(timeout, Client::new(address.as_str()))
            .await
            .map_err(|_| {
                Error::connection(
                    format!("timed out after {}s connecting to {address}", timeout.as_secs()),
                    self.lifecycle.metadata(),
                )
            })?
            .map_err(|e| {
                Error::connection_with_source(
                    format!("failed to connect to {address}"),
                    self.lifecycle.metadata(),
                    e,
                )
            })?;

        debug!(url = %address, "Memcached connection established");
        Ok(Arc::new(Mutex::new(client)))
    }

    /// Translate a client failure. I/O failures leave the connection in an
    /// unknown state, so it is dropped and the error is a connection error.
    async fn fail(
        &self,
        client: &SharedClient,
        operation: Operation,
        key: &str,
        error: async_memcached::Error,
    ) -> Error {
        if matches!(
            error,
            async_memcached::Error::Io(_) | async_memcached::Error::Connect(_)
        ) {
            self.lifecycle
                .invalidate(|current| Arc::ptr_eq(current, client))
                .await;
            let prefix = self.lifecycle.name().namespace_prefix();
            Error::connection_with_source(
                format!("Memcached connection lost during {operation}"),
                self.lifecycle
                    .metadata()
                    .operation(operation)
                    .key(key.strip_prefix(prefix.as_str()).unwrap_or(key)),
                error,
            )
        } else {
            Error::backend_with_source(format!("Memcached {operation} failed"), error)
        }
    }

    async fn fetch(&self, key: &str, operation: Operation) -> Result<Option<String>> {
        validate_key(key)?;
        let client = self.link().await?;
        let outcome = client.lock().await.get(key).await;

        match outcome {
            Ok(Some(value)) => {
                let payload = String::from_utf8(value.data.unwrap_or_default())
                    .map_err(|e| Error::backend_with_source("Invalid UTF-8 data", e))?;
                debug!(key = key, "Cache HIT (memcached)");
                Ok(Some(payload))
            }
            Ok(None) => {
                self.index.remove(key);
                debug!(key = key, "Cache MISS (memcached)");
                Ok(None)
            }
            Err(e) => Err(self.fail(&client, operation, key, e).await),
        }
    }

    fn track(&self, key: &str, expiry: u64) {
        let deadline = (expiry > 0).then(|| Instant::now() + Duration::from_secs(expiry));
        self.index.insert(key.to_string(), deadline);

        if self.index.len() >= self.prune_at.load(Ordering::Relaxed) {
            let live = self.prune();
            self.prune_at.store(
                live.saturating_mul(2).max(MEMCACHED_INDEX_PRUNE_FLOOR),
                Ordering::Relaxed,
            );
        }
    }

    /// Forget indexed keys the server has already expired
    fn prune(&self) -> usize {
        let now = Instant::now();
        self.index
            .retain(|_, deadline| deadline.is_none_or(|at| at > now));
        self.index.len()
    }
}

impl std::fmt::Debug for MemcachedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcachedEngine")
            .field("instance", &self.lifecycle.name().as_str())
            .field("server", &self.server_address())
            .field("state", &self.lifecycle.state())
            .field("indexed_keys", &self.index.len())
            .finish()
    }
}

#[async_trait]
impl CacheEngine for MemcachedEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Memcached
    }

    fn state(&self) -> EngineState {
        self.lifecycle.state()
    }

    async fn init(&self) -> Result<()> {
        self.link().await.map(|_| ())
    }

    async fn finalize(&self) -> Result<()> {
        self.lifecycle.disconnect().await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.fetch(key, Operation::Has).await?.is_some())
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        self.fetch(key, Operation::Get).await
    }

    async fn write(&self, key: &str, payload: &str, expiry: u64) -> Result<()> {
        validate_key(key)?;
        let ttl = ttl(expiry)?;
        let client = self.link().await?;
        let outcome = client
            .lock()
            .await
            .set(key, payload.as_bytes(), Some(ttl), None)
            .await;

        if let Err(e) = outcome {
            return Err(self.fail(&client, Operation::Set, key, e).await);
        }
        self.track(key, expiry);
        debug!(key = key, ttl_seconds = ttl, "Cache SET (memcached)");
        Ok(())
    }

    async fn renew(&self, key: &str, _payload: &str, expiry: u64) -> Result<()> {
        validate_key(key)?;
        let ttl = ttl(expiry)?;
        let client = self.link().await?;

        // Touch only; a value written or deleted since the read stays as is
        let touch = format!("T{ttl}");
        let flags = [touch.as_str(), "t"];
        let outcome = client
            .lock()
            .await
            .meta_get(key, false, None, Some(&flags[..]))
            .await;

        match outcome {
            Ok(Some(value)) if !matches!(value.status, Some(Status::NotFound)) => {
                self.track(key, expiry);
                debug!(key = key, ttl_seconds = ttl, "Cache RENEW (memcached)");
                Ok(())
            }
            Ok(_) => {
                self.index.remove(key);
                debug!(key = key, "Cache RENEW skipped, entry gone (memcached)");
                Ok(())
            }
            Err(e) => Err(self.fail(&client, Operation::Get, key, e).await),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let client = self.link().await?;
        let outcome = client.lock().await.delete(key).await;

        match outcome {
            Ok(()) => debug!(key = key, "Cache DEL (memcached)"),
            Err(async_memcached::Error::Protocol(Status::NotFound)) => {
                debug!(key = key, "Cache DEL of absent key (memcached)");
            }
            Err(e) => return Err(self.fail(&client, Operation::Delete, key, e).await),
        }
        self.index.remove(key);
        Ok(())
    }

    async fn clear(&self, prefix: &str) -> Result<u64> {
        let client = self.link().await?;
        self.prune();
        let keys: Vec<String> = self
            .index
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        let mut deleted: u64 = 0;
        for key in &keys {
            let outcome = client.lock().await.delete(key.as_str()).await;
            match outcome {
                Ok(()) => deleted += 1,
                Err(async_memcached::Error::Protocol(Status::NotFound)) => {}
                Err(e) => return Err(self.fail(&client, Operation::Clear, key, e).await),
            }
            self.index.remove(key);
        }

        debug!(prefix = %prefix, deleted = deleted, "Cache namespace DEL (memcached)");
        Ok(deleted)
    }
}

fn ttl(expiry: u64) -> Result<i64> {
    i64::try_from(expiry)
        .map_err(|_| Error::backend(format!("expiry {expiry} exceeds memcached range")))
}

/// Reject keys the memcached text protocol cannot carry
fn validate_key(key: &str) -> Result<()> {
    if key.len() > MEMCACHED_MAX_KEY_LENGTH {
        return Err(Error::backend(format!(
            "key exceeds {MEMCACHED_MAX_KEY_LENGTH} bytes"
        )));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::backend(
            "key contains whitespace or control characters",
        ));
    }
    Ok(())
}
