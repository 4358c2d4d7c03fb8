//! Operator commands
//!
//! `list` shows what a configuration declares. `check` connects every
//! declared cache once and reports the outcome, which makes it usable as a
//! deployment smoke test.

use crate::CacheRegistry;
use std::fmt;
use tracing::warn;

/// One declared cache as shown by `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    /// Normalized name
    pub name: String,
    /// Engine kind
    pub engine: stash_domain::EngineKind,
    /// Default expiry in seconds
    pub default_expiry: u64,
}

impl fmt::Display for CacheSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:<10} default_expiry={}s",
            self.name, self.engine, self.default_expiry
        )
    }
}

/// Outcome of checking one cache
#[derive(Debug)]
pub struct CheckReport {
    /// Normalized name
    pub name: String,
    /// `None` when the cache connected
    pub error: Option<stash_domain::Error>,
}

impl CheckReport {
    /// Whether the cache connected
    pub fn is_ready(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            None => write!(f, "{:<24} READY", self.name),
            Some(error) => write!(f, "{:<24} FAILED {error}", self.name),
        }
    }
}

/// Summaries of every cache declared in `registry`, sorted by name
pub fn list(registry: &CacheRegistry) -> Vec<CacheSummary> {
    registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let config = registry.config(&name)?;
            Some(CacheSummary {
                name,
                engine: config.kind(),
                default_expiry: config.default_expiry(),
            })
        })
        .collect()
}

/// Initialize every declared cache, then finalize them all
pub async fn check(registry: &CacheRegistry) -> Vec<CheckReport> {
    let mut reports = Vec::new();
    for name in registry.names() {
        let outcome = match registry.get(&name) {
            Ok(cache) => cache.init().await,
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            warn!(instance = %name, error = %e, "cache check failed");
        }
        reports.push(CheckReport {
            name,
            error: outcome.err(),
        });
    }
    if let Err(e) = registry.finalize_all().await {
        warn!(error = %e, "finalize after check failed");
    }
    reports
}
