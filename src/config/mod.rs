//! Configuration management for bulletin-rs
//!
//! Layered loading, lowest to highest priority:
//! 1. `default.toml`
//! 2. `{environment}.toml`
//! 3. `local.toml` (not committed)
//! 4. `BULLETIN_*` environment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{LoggerSettings, MessagingConfig, ServerConfig, Settings};
