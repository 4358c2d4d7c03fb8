//! Infrastructure layer constants
//!
//! Domain values (expiry bounds, default ports) live in
//! `stash_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "stash.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "stash";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "STASH";

/// Separator between nested keys in environment variable names
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the configured log filter
pub const LOG_FILTER_ENV: &str = "STASH_LOG";

/// File stem used when the log file path has none
pub const DEFAULT_LOG_FILE_STEM: &str = "stash";
