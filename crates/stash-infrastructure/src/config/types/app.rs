//! Top-level configuration

use super::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use stash_domain::CacheOptions;
use std::collections::BTreeMap;

/// Complete configuration file contents
///
/// ```toml
/// [logging]
/// level = "debug"
///
/// [caches.sessions]
/// engine = "MEMORY"
/// default_expiry = 300
///
/// [caches.profiles]
/// engine = "REDIS"
/// host = "cache.internal"
/// db = 1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// Logging setup
    pub logging: LoggingConfig,

    /// Declared caches by name
    pub caches: BTreeMap<String, CacheOptions>,
}

impl StashConfig {
    /// Add a cache declaration
    #[must_use]
    pub fn with_cache<S: Into<String>>(mut self, name: S, options: CacheOptions) -> Self {
        self.caches.insert(name.into(), options);
        self
    }
}
