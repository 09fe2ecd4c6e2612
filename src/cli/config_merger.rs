//! Configuration merger for CLI arguments and config files
//!
//! CLI arguments take precedence over file and environment variable values.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, Settings};
use std::path::Path;

/// Merges CLI argument overrides into file-based configuration
pub struct ConfigurationMerger {
    base_config: Settings,
    environment: Environment,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings, environment: Environment) -> Self {
        Self {
            base_config,
            environment,
        }
    }

    /// Load the base configuration for the given CLI arguments
    ///
    /// `--config` selects single-file mode; otherwise the layered files are
    /// resolved from the process environment. `--env` overrides
    /// `BULLETIN_APP_ENV` in both modes.
    ///
    /// The loaded settings are not validated here; validation runs after the
    /// CLI overrides are merged.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let environment = cli
            .env
            .map(Environment::from)
            .unwrap_or_else(Environment::from_env);

        let loader = match cli.config.as_deref() {
            Some(path) => {
                Self::validate_config_file_access(path)?;
                ConfigLoader::from_file(path, environment)
            }
            None => ConfigLoader::new()?.with_environment(environment),
        };

        Ok(Self::new(loader.load_unvalidated()?, environment))
    }

    fn validate_config_file_access(path: &Path) -> Result<(), ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::validation(
                "config_file",
                format!(
                    "Configuration file does not exist or is not a file: '{}'",
                    path.display()
                ),
            ));
        }
        Ok(())
    }

    /// Apply CLI overrides to the base configuration and validate the result
    ///
    /// 1. `--verbose` / `--quiet` set the log level
    /// 2. `serve` arguments override host, port and log level
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        Self::apply_global_overrides(&mut config, cli);

        if let Some(ref command) = cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;

        Ok(config)
    }

    fn apply_global_overrides(config: &mut Settings, cli: &Cli) {
        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host_addr) = host {
                    config.server.host = host_addr.clone();
                }

                if let Some(port_num) = port {
                    config.server.port = *port_num;
                }

                // Command-specific level wins over --verbose/--quiet
                if let Some(level) = log_level {
                    config.logger.level = (*level).into();
                }
            }
            Commands::Dispatch { .. } => {}
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }
}
