//! # Stash Domain Layer
//!
//! Core types shared by every layer of the cache stack.
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Structured error taxonomy with attributable metadata |
//! | [`value_objects`] | Cache names, stored entries, configuration and per-call options |
//! | [`ports`] | The [`CacheEngine`](ports::CacheEngine) contract implemented by backends |
//! | [`constants`] | Expiry bounds, default ports, key separator |

/// Domain constants
pub mod constants;
/// Error taxonomy
pub mod error;
/// Port traits implemented by provider crates
pub mod ports;
/// Value objects
pub mod value_objects;

pub use error::{Error, ErrorKind, ErrorMetadata, Operation, Result};
pub use ports::{CacheEngine, EngineState};
pub use value_objects::{
    CacheConfig, CacheEntry, CacheName, CacheOptions, EngineConfig, EngineKind, MemcachedConfig,
    RedisConfig, Secret, SetOptions, expiry_in_bounds,
};
