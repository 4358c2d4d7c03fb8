//! Domain layer constants
//!
//! Values that define the observable contract of a cache: expiry bounds,
//! namespace separator and the defaults applied while resolving options.

// ============================================================================
// EXPIRY CONSTANTS
// ============================================================================

/// Largest accepted expiry in seconds (60 hours)
pub const MAX_EXPIRY_SECS: i64 = 216_000;

/// Smallest accepted expiry in seconds; zero means the entry never expires
pub const MIN_EXPIRY_SECS: i64 = 0;

/// Default expiry applied when neither the call nor the config sets one (5 minutes)
pub const DEFAULT_EXPIRY_SECS: i64 = 300;

// ============================================================================
// NAMESPACE CONSTANTS
// ============================================================================

/// Separator between the instance name and the caller key
pub const KEY_SEPARATOR: &str = ":";

// ============================================================================
// NETWORK ENGINE CONSTANTS
// ============================================================================

/// Default Redis port
pub const REDIS_DEFAULT_PORT: u16 = 6379;

/// Default Memcached port
pub const MEMCACHED_DEFAULT_PORT: u16 = 11211;

/// Default connect timeout for network engines in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
