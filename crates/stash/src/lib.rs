//! # Stash
//!
//! One cache contract over interchangeable engines: an in-process memory map,
//! Redis, or Memcached.
//!
//! ## Features
//!
//! - **Uniform contract**: `has`, `get`, `set`, `delete`, `clear` behave the
//!   same on every engine
//! - **Namespacing**: every key is stored as `"<cache name>:<key>"`, so caches
//!   sharing a server never see each other's entries
//! - **Sliding expiry**: window-mode entries renew their expiry on every read
//! - **Lazy connections**: declared caches connect on first use, once
//! - **Attributable errors**: every failure names its engine, instance,
//!   operation and key
//!
//! ## Example
//!
//! ```ignore
//! use stash::{CacheOptions, CacheRegistry, SetOptions};
//!
//! let registry = CacheRegistry::new();
//! registry.register("sessions", &CacheOptions::memory().with_default_expiry(300))?;
//!
//! let sessions = registry.get("sessions")?;
//! sessions.set("u1", &serde_json::json!({"id": 1}), SetOptions::new()).await?;
//! let user: Option<serde_json::Value> = sessions.get("u1").await?;
//! ```

/// Domain layer - error taxonomy, value objects and the engine port
pub mod domain {
    pub use stash_domain::*;
}

/// Engine implementations
pub mod providers {
    pub use stash_providers::*;
}

/// Infrastructure layer - cache contract, registry, config and logging
pub mod infrastructure {
    pub use stash_infrastructure::*;
}

/// Operator commands behind the `stash` binary
pub mod cli;

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the caller-facing infrastructure types
pub use infrastructure::{Cache, CacheRegistry, ConfigLoader, LoggingConfig, StashConfig};
