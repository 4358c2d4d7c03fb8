//! Error extension utilities
//!
//! Maps foreign errors (I/O, figment, subscriber setup) into the domain
//! taxonomy.

use stash_domain::error::{Error, ErrorMetadata, Result};
use std::fmt;

/// Extension trait for adding context to errors
///
/// # Example
///
/// ```ignore
/// use stash_infrastructure::error_ext::ErrorContext;
///
/// let config: StashConfig = figment
///     .extract()
///     .config_context("Failed to extract configuration")?;
/// ```
pub trait ErrorContext<T> {
    /// Convert the error into a configuration error prefixed with `context`
    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display;

    /// Like [`config_context`](Self::config_context) with lazily built context
    fn with_config_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: fmt::Display,
{
    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|err| Error::config(format!("{context}: {err}"), ErrorMetadata::new()))
    }

    fn with_config_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|err| Error::config(format!("{}: {err}", f()), ErrorMetadata::new()))
    }
}
