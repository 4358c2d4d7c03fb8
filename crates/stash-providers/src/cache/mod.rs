//! Cache engine implementations
//!
//! | Engine | Expiry | Namespace clear |
//! |--------|--------|-----------------|
//! | [`MemoryEngine`] | tokio timer per key | map scan |
//! | `RedisEngine` | `SET .. EX` / `EXPIRE` | `SCAN` + `DEL` |
//! | `MemcachedEngine` | server TTL | local key index |

mod lifecycle;

/// In-process memory engine
pub mod memory;

/// Redis engine
#[cfg(feature = "cache-redis")]
pub mod redis;

/// Memcached engine
#[cfg(feature = "cache-memcached")]
pub mod memcached;

pub use memory::MemoryEngine;

#[cfg(feature = "cache-memcached")]
pub use memcached::MemcachedEngine;
#[cfg(feature = "cache-redis")]
pub use redis::RedisEngine;

use stash_domain::{
    CacheEngine, CacheName, EngineConfig, EngineKind, Error, ErrorMetadata, Operation, Result,
};
use std::sync::Arc;

/// Whether `kind` is compiled into this build
pub fn is_supported(kind: EngineKind) -> bool {
    match kind {
        EngineKind::Memory => true,
        EngineKind::Redis => cfg!(feature = "cache-redis"),
        EngineKind::Memcached => cfg!(feature = "cache-memcached"),
    }
}

/// Fail with [`Error::Unsupported`] when `kind` is compiled out of this build
pub fn ensure_supported(name: &CacheName, kind: EngineKind) -> Result<()> {
    if is_supported(kind) {
        Ok(())
    } else {
        Err(unsupported_engine(name, kind))
    }
}

/// Build the engine for a resolved configuration.
///
/// The engine starts `Closed`; nothing connects until `init` or first use.
pub fn create_engine(name: &CacheName, config: &EngineConfig) -> Result<Arc<dyn CacheEngine>> {
    let engine: Arc<dyn CacheEngine> = match config {
        EngineConfig::Memory => Arc::new(MemoryEngine::new(name.clone())),

        #[cfg(feature = "cache-redis")]
        EngineConfig::Redis(redis) => Arc::new(RedisEngine::new(name.clone(), redis.clone())),
        #[cfg(not(feature = "cache-redis"))]
        EngineConfig::Redis(_) => return Err(unsupported_engine(name, EngineKind::Redis)),

        #[cfg(feature = "cache-memcached")]
        EngineConfig::Memcached(memcached) => {
            Arc::new(MemcachedEngine::new(name.clone(), memcached.clone()))
        }
        #[cfg(not(feature = "cache-memcached"))]
        EngineConfig::Memcached(_) => {
            return Err(unsupported_engine(name, EngineKind::Memcached));
        }
    };

    tracing::debug!(engine = %config.kind(), instance = %name, "cache engine created");
    Ok(engine)
}

fn unsupported_engine(name: &CacheName, kind: EngineKind) -> Error {
    let feature = match kind {
        EngineKind::Memory => "default",
        EngineKind::Redis => "cache-redis",
        EngineKind::Memcached => "cache-memcached",
    };
    Error::unsupported(
        format!("engine {kind} is not available in this build (enable the '{feature}' feature)"),
        ErrorMetadata::new()
            .engine(kind)
            .instance(name.as_str())
            .operation(Operation::Register)
            .config("engine", kind),
    )
}
