//! Configuration loader
//!
//! Sources are merged in this order (later sources override earlier):
//! 1. `StashConfig::default()`
//! 2. TOML file: the explicit path, or the first of `./stash.toml`,
//!    `./stash/stash.toml`, `<user config dir>/stash/stash.toml`
//! 3. Environment variables prefixed `STASH_`, nested with `__`
//!    (e.g. `STASH_CACHES__SESSIONS__ENGINE=REDIS`)

use crate::config::StashConfig;
use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME,
};
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use stash_domain::CacheName;
use stash_domain::error::{Error, ErrorMetadata, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    #[must_use]
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Get the configured file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Load and validate configuration from all sources
    pub fn load(&self) -> Result<StashConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(StashConfig::default()));

        if let Some(config_path) = &self.config_path {
            // An explicit path that does not exist is an operator mistake
            if !config_path.exists() {
                log_config_loaded(config_path, false);
                return Err(Error::config(
                    format!("configuration file not found: {}", config_path.display()),
                    ErrorMetadata::new().config("config_path", config_path.display()),
                ));
            }
            figment = figment.merge(Toml::file(config_path));
            log_config_loaded(config_path, true);
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        figment = figment.merge(
            Env::prefixed(&format!("{}_", self.env_prefix)).split(CONFIG_ENV_SEPARATOR),
        );

        let config: StashConfig = figment
            .extract()
            .config_context("Failed to extract configuration")?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Find the first default configuration file that exists
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = [
            Some(current_dir.join(DEFAULT_CONFIG_FILENAME)),
            Some(
                current_dir
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME),
            ),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME)),
        ];

        candidates.into_iter().flatten().find(|path| path.exists())
    }
}

/// Fail fast on anything that would only surface later at registration
fn validate_config(config: &StashConfig) -> Result<()> {
    parse_log_level(&config.logging.level)?;
    for (name, options) in &config.caches {
        let name = CacheName::new(name)?;
        let resolved = options.resolve(&name)?;
        stash_providers::cache::ensure_supported(&name, resolved.kind())?;
    }
    Ok(())
}
