//! Stored entry record
//!
//! Every engine stores the same serialized record, so a value written through
//! one engine decodes identically through any other:
//!
//! ```json
//! {"data": <caller value>, "expiry": 300, "window": false}
//! ```

use serde::{Deserialize, Serialize};

/// The wrapper stored under a namespaced key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Caller value
    pub data: serde_json::Value,
    /// Expiry in seconds; 0 never expires
    pub expiry: u64,
    /// Sliding expiry: each successful read renews the full expiry
    pub window: bool,
}

impl CacheEntry {
    /// Create a new entry
    pub fn new(data: serde_json::Value, expiry: u64, window: bool) -> Self {
        Self {
            data,
            expiry,
            window,
        }
    }

    /// Whether a successful read must renew this entry's expiry
    pub fn renews_on_read(&self) -> bool {
        self.window && self.expiry > 0
    }

    /// Serialize to the wire payload
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a wire payload
    pub fn decode(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}
