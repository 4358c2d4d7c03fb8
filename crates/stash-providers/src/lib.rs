//! # Stash - Engine Implementations
//!
//! Each engine implements the [`CacheEngine`] port defined in `stash-domain`.
//!
//! | Engine | Type | Feature |
//! |--------|------|---------|
//! | Memory | [`cache::MemoryEngine`] | always on |
//! | Redis | `cache::RedisEngine` | `cache-redis` |
//! | Memcached | `cache::MemcachedEngine` | `cache-memcached` |
//!
//! Engines are normally built through [`cache::create_engine`], which maps a
//! resolved [`EngineConfig`](stash_domain::EngineConfig) onto the matching
//! implementation and reports engines compiled out of the build as
//! unsupported.
//!
//! ```toml
//! [dependencies]
//! stash-providers = { version = "0.1", default-features = false, features = ["cache-redis"] }
//! ```

pub use stash_domain::error::{Error, Result};
pub use stash_domain::ports::{CacheEngine, EngineState};

/// Provider-specific constants
pub mod constants;

/// Cache engine implementations
pub mod cache;
