//! Caching
//!
//! | Type | Role |
//! |------|------|
//! | [`Cache`] | The contract callers use: has/get/set/delete/clear over one engine |
//! | [`CacheRegistry`] | Name to declaration, and lazily to a live [`Cache`] |

pub mod instance;
pub mod registry;

pub use instance::Cache;
pub use registry::CacheRegistry;
