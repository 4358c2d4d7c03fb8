//! Cache names and key namespacing

use crate::constants::KEY_SEPARATOR;
use crate::error::{Error, ErrorMetadata, Operation, Result};
use std::fmt;

/// Normalized cache instance name.
///
/// Names are trimmed and lowercased, so `" Sessions "` and `"sessions"`
/// identify the same cache. The name doubles as the key namespace: every key
/// an instance stores is prefixed with `"<name>:"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheName(String);

impl CacheName {
    /// Normalize and validate a raw name.
    ///
    /// Empty names and names containing the key separator are rejected; the
    /// latter would let `"a:b"` + `"c"` collide with `"a"` + `"b:c"`.
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(Error::config(
                "cache name cannot be empty",
                ErrorMetadata::new()
                    .operation(Operation::Register)
                    .config("name", raw),
            ));
        }
        if normalized.contains(KEY_SEPARATOR) {
            return Err(Error::config(
                format!("cache name cannot contain '{KEY_SEPARATOR}'"),
                ErrorMetadata::new()
                    .instance(normalized.as_str())
                    .operation(Operation::Register)
                    .config("name", raw),
            ));
        }
        Ok(Self(normalized))
    }

    /// The normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a caller key (trim + lowercase)
    pub fn normalize_key(key: &str) -> String {
        key.trim().to_lowercase()
    }

    /// Physical key stored in the engine: `"<name>:<normalized key>"`
    pub fn namespaced_key(&self, key: &str) -> String {
        format!("{}{}{}", self.0, KEY_SEPARATOR, Self::normalize_key(key))
    }

    /// Prefix shared by every key of this instance
    pub fn namespace_prefix(&self) -> String {
        format!("{}{}", self.0, KEY_SEPARATOR)
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
