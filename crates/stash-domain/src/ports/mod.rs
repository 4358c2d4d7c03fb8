//! Domain Port Interfaces
//!
//! Contracts that provider crates implement. The cache contract in the
//! infrastructure layer only ever talks to a backend through these traits.

/// Cache engine port
pub mod engine;

pub use engine::{CacheEngine, EngineState};
