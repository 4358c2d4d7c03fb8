//! In-process memory engine
//!
//! Entries live in a [`DashMap`] owned by the engine. Every entry with a
//! non-zero expiry gets its own tokio timer task; rewriting, renewing or
//! removing the entry aborts the previous timer before a new one is armed, so
//! at most one live timer exists per key.
//!
//! Timers only hold a weak reference to the map and remove an entry only if it
//! still carries the generation they were armed for. Reads additionally check
//! the deadline, so an entry is never served past its expiry even if its timer
//! has not run yet.

use super::lifecycle::Lifecycle;
use async_trait::async_trait;
use dashmap::DashMap;
use stash_domain::{CacheEngine, CacheName, EngineKind, EngineState, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

type Entries = DashMap<String, Slot>;

#[derive(Debug)]
struct Slot {
    payload: String,
    deadline: Option<Instant>,
    generation: u64,
    timer: Option<AbortHandle>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| now < deadline)
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Memory engine
///
/// Suitable for single-process deployments and tests. Contents are lost when
/// the engine is finalized.
pub struct MemoryEngine {
    lifecycle: Lifecycle<()>,
    entries: Arc<Entries>,
    generation: AtomicU64,
}

impl MemoryEngine {
    /// Create an empty engine for the named instance
    pub fn new(name: CacheName) -> Self {
        Self {
            lifecycle: Lifecycle::new(EngineKind::Memory, name),
            entries: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the engine holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn open(&self) -> Result<()> {
        self.lifecycle.connect(|| async { Ok(()) }).await
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Arm a timer removing `key` at `deadline` if it still holds `generation`
    fn arm_timer(&self, key: &str, generation: u64, deadline: Instant) -> AbortHandle {
        let entries: Weak<Entries> = Arc::downgrade(&self.entries);
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(entries) = entries.upgrade()
                && entries
                    .remove_if(&key, |_, slot| slot.generation == generation)
                    .is_some()
            {
                debug!(key = %key, "memory entry expired");
            }
        })
        .abort_handle()
    }

    /// Drop `key` if its deadline has passed
    fn sweep(&self, key: &str, now: Instant) {
        if let Some((_, mut slot)) = self.entries.remove_if(key, |_, slot| !slot.is_live(now)) {
            slot.cancel_timer();
        }
    }

    fn deadline(expiry: u64) -> Option<Instant> {
        (expiry > 0).then(|| Instant::now() + Duration::from_secs(expiry))
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("instance", &self.lifecycle.name().as_str())
            .field("state", &self.lifecycle.state())
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[async_trait]
impl CacheEngine for MemoryEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Memory
    }

    fn state(&self) -> EngineState {
        self.lifecycle.state()
    }

    async fn init(&self) -> Result<()> {
        self.open().await
    }

    async fn finalize(&self) -> Result<()> {
        self.entries.retain(|_, slot| {
            slot.cancel_timer();
            false
        });
        self.lifecycle.disconnect().await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.open().await?;
        let now = Instant::now();
        let live = self.entries.get(key).map(|slot| slot.is_live(now));
        match live {
            Some(true) => Ok(true),
            Some(false) => {
                self.sweep(key, now);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        self.open().await?;
        let now = Instant::now();
        let found = self
            .entries
            .get(key)
            .map(|slot| slot.is_live(now).then(|| slot.payload.clone()));
        match found {
            Some(Some(payload)) => Ok(Some(payload)),
            Some(None) => {
                self.sweep(key, now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, payload: &str, expiry: u64) -> Result<()> {
        self.open().await?;
        let generation = self.next_generation();
        let deadline = Self::deadline(expiry);
        let slot = Slot {
            payload: payload.to_string(),
            deadline,
            generation,
            timer: deadline.map(|deadline| self.arm_timer(key, generation, deadline)),
        };
        if let Some(mut previous) = self.entries.insert(key.to_string(), slot) {
            previous.cancel_timer();
        }
        Ok(())
    }

    async fn renew(&self, key: &str, _payload: &str, expiry: u64) -> Result<()> {
        self.open().await?;
        let generation = self.next_generation();
        let deadline = Self::deadline(expiry);
        if let Some(mut slot) = self.entries.get_mut(key) {
            slot.cancel_timer();
            slot.generation = generation;
            slot.deadline = deadline;
            slot.timer = deadline.map(|deadline| self.arm_timer(key, generation, deadline));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.open().await?;
        if let Some((_, mut slot)) = self.entries.remove(key) {
            slot.cancel_timer();
        }
        Ok(())
    }

    async fn clear(&self, prefix: &str) -> Result<u64> {
        self.open().await?;
        let mut removed = 0u64;
        self.entries.retain(|key, slot| {
            if key.starts_with(prefix) {
                slot.cancel_timer();
                removed += 1;
                false
            } else {
                true
            }
        });
        debug!(prefix = %prefix, removed, "memory namespace cleared");
        Ok(removed)
    }
}
