pub mod config;
pub mod core;
pub mod logging;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{ClientConfig, ConfigError};
pub use crate::core::*;
pub use logging::{LogSink, TracingLogSink};
