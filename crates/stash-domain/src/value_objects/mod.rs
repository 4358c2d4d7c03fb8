//! Value objects
//!
//! Immutable types that describe what a cache is (its name and configuration),
//! what it stores (the entry record) and how a single write behaves.

/// Cache configuration, from flat options to the typed engine variant
pub mod config;
/// Stored entry record
pub mod entry;
/// Normalized cache name and key namespacing
pub mod name;
/// Per-call write options
pub mod options;

pub use config::{
    CacheConfig, CacheOptions, EngineConfig, EngineKind, MemcachedConfig, RedisConfig, Secret,
};
pub use entry::CacheEntry;
pub use name::CacheName;
pub use options::{SetOptions, expiry_in_bounds};
