//! Cache Engine Port
//!
//! The minimal primitive set a storage backend provides. Keys arriving here are
//! already normalized and namespaced (`"<instance>:<key>"`); payloads are the
//! serialized [`CacheEntry`](crate::CacheEntry) record.
//!
//! ## Lifecycle
//!
//! ```text
//! Closed --init--> Open
//!   ^               |
//!   +---finalize----+
//! Closed --init fails--> Failed --finalize--> Closed
//! ```
//!
//! Every primitive invoked while `Closed` connects first. A `Failed` engine
//! rejects every call with a connection error until it is finalized.

use crate::error::Result;
use crate::value_objects::EngineKind;
use async_trait::async_trait;
use std::fmt;

/// Connection state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Not connected yet, or finalized
    Closed,
    /// Connected and serving operations
    Open,
    /// Last connect failed; calls fail fast until finalized
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("CLOSED"),
            Self::Open => f.write_str("OPEN"),
            Self::Failed => f.write_str("FAILED"),
        }
    }
}

/// Cache Engine Port
///
/// # Implementations
///
/// - **Memory**: in-process map with one expiry timer per key
/// - **Redis**: server-side TTL, `SCAN`-based namespace clearing
/// - **Memcached**: server-side TTL, locally indexed namespace clearing
///
/// Primitives return [`Error::Backend`](crate::Error::Backend) for raw client
/// failures and typed errors (e.g. connection) where the engine can attribute
/// them itself.
#[async_trait]
pub trait CacheEngine: Send + Sync + fmt::Debug {
    /// Engine kind
    fn kind(&self) -> EngineKind;

    /// Current connection state
    fn state(&self) -> EngineState;

    /// Connect; idempotent, and concurrent callers share one attempt
    async fn init(&self) -> Result<()>;

    /// Disconnect; idempotent
    async fn finalize(&self) -> Result<()>;

    /// Whether a live entry exists at `key`
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Raw payload stored at `key`
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Store `payload` at `key`, expiring after `expiry` seconds (0 = never)
    async fn write(&self, key: &str, payload: &str, expiry: u64) -> Result<()>;

    /// Restart the expiry of an existing entry after a successful read
    async fn renew(&self, key: &str, payload: &str, expiry: u64) -> Result<()>;

    /// Remove `key`; absent keys are not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key starting with `prefix`, returning how many were removed
    async fn clear(&self, prefix: &str) -> Result<u64>;
}
