//! Configuration types module

pub mod app;
pub mod logging;

pub use app::StashConfig;
pub use logging::LoggingConfig;
