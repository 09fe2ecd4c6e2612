//! CLI module for bulletin-rs
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files)
//! - Command execution and validation

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use crate::config::{Environment as AppEnvironment, Settings};
use crate::logger::init_logger;

/// Load configuration files and merge CLI overrides
///
/// # Returns
/// Validated settings and the environment they were loaded for
///
/// # Errors
/// Returns error if configuration loading, merging, or validation fails
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<(Settings, AppEnvironment)> {
    let merger = ConfigurationMerger::from_cli(cli)
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    let settings = merger
        .merge_cli_args(cli)
        .map_err(|e| anyhow::anyhow!("Configuration merge error: {e}"))?;

    Ok((settings, merger.environment()))
}

/// Initialize logger from settings
///
/// # Errors
/// Returns error if the logger settings are invalid or a global subscriber
/// is already installed
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .map_err(|e| anyhow::anyhow!("Logger configuration error: {e}"))?;

    init_logger(logger_config)
}
