//! Configuration
//!
//! [`StashConfig`] declares the logging setup and every named cache.
//! [`ConfigLoader`] assembles it from defaults, a TOML file and `STASH_`
//! environment variables.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{LoggingConfig, StashConfig};
