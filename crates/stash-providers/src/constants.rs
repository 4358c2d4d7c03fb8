//! Provider layer constants

/// Keys requested per `SCAN` round trip when clearing a Redis namespace
pub const REDIS_SCAN_COUNT: usize = 100;

/// Longest key accepted by the memcached text protocol, in bytes
pub const MEMCACHED_MAX_KEY_LENGTH: usize = 250;

/// URL scheme accepted by the memcached client
pub const MEMCACHED_URL_SCHEME: &str = "tcp";

/// Plain-text Redis URL scheme
pub const REDIS_URL_SCHEME: &str = "redis";

/// TLS Redis URL scheme
pub const REDIS_TLS_URL_SCHEME: &str = "rediss";

/// Size below which the memcached key index is never pruned for expiry
pub const MEMCACHED_INDEX_PRUNE_FLOOR: usize = 1024;
