//! Per-call write options

use crate::constants::{MAX_EXPIRY_SECS, MIN_EXPIRY_SECS};

/// Options for a single `set`.
///
/// Unset fields fall back to the instance's `default_expiry` and to a fixed
/// (non-sliding) expiry respectively.
///
/// # Example
///
/// ```ignore
/// use stash_domain::SetOptions;
///
/// let opts = SetOptions::new().with_expiry(60).with_window(true);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expiry in seconds, 0 for never
    pub expiry: Option<i64>,
    /// Sliding expiry
    pub window: Option<bool>,
}

impl SetOptions {
    /// Options that inherit every default
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expiry in seconds
    #[must_use]
    pub fn with_expiry(mut self, secs: i64) -> Self {
        self.expiry = Some(secs);
        self
    }

    /// Enable or disable sliding expiry
    #[must_use]
    pub fn with_window(mut self, window: bool) -> Self {
        self.window = Some(window);
        self
    }

    /// Resolved window flag
    pub fn effective_window(&self) -> bool {
        self.window.unwrap_or(false)
    }
}

/// Expiry as unsigned seconds if it lies in the accepted inclusive range
pub fn expiry_in_bounds(secs: i64) -> Option<u64> {
    if (MIN_EXPIRY_SECS..=MAX_EXPIRY_SECS).contains(&secs) {
        u64::try_from(secs).ok()
    } else {
        None
    }
}
