//! # Infrastructure Layer
//!
//! Everything a caller touches: the cache contract built on top of an engine,
//! the registry that maps names to lazily built caches, and the ambient
//! configuration and logging setup.
//!
//! ## Module Categories
//!
//! ### Caching
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | The [`Cache`](cache::Cache) contract and the [`CacheRegistry`](cache::CacheRegistry) |
//!
//! ### Configuration
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | TOML + environment configuration via figment |
//! | [`constants`] | File names, env prefixes, defaults |
//!
//! ### Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`logging`] | Structured logging with tracing |

pub mod cache;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;

// Re-export commonly used types
pub use cache::{Cache, CacheRegistry};
pub use config::{ConfigLoader, LoggingConfig, StashConfig};
pub use error_ext::ErrorContext;
