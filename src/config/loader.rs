//! Configuration loader for bulletin-rs
//!
//! Resolves the configuration sources from the process environment and
//! merges them with the `config` crate.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "BULLETIN_CONFIG_DIR";

const CONFIG_FILE_ENV: &str = "BULLETIN_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "BULLETIN";

/// Separator for nested keys: `BULLETIN_MESSAGING__PROJECT_ID` -> `messaging.project_id`
const ENV_SEPARATOR: &str = "__";

/// Where file-based configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    /// `default.toml`, `{environment}.toml` and `local.toml` from a directory
    Layered(PathBuf),
    /// A single file, skipping the layered lookup
    SingleFile(PathBuf),
}

/// Configuration loader that handles layered configuration loading
///
/// Environment variables prefixed with `BULLETIN_` always take precedence
/// over file values.
#[derive(Debug)]
pub struct ConfigLoader {
    source: Source,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `BULLETIN_CONFIG_DIR`, `BULLETIN_CONFIG_FILE`
    /// and `BULLETIN_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Returns an error if both `BULLETIN_CONFIG_DIR` and
    /// `BULLETIN_CONFIG_FILE` are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV).ok();

        let source = match (config_dir, config_file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::mutual_exclusivity(
                    "BULLETIN_CONFIG_DIR and BULLETIN_CONFIG_FILE cannot both be set. \
                     Use BULLETIN_CONFIG_DIR for layered configuration or \
                     BULLETIN_CONFIG_FILE for a single configuration file.",
                ));
            }
            (None, Some(file)) => Source::SingleFile(PathBuf::from(file)),
            (dir, None) => Source::Layered(
                dir.map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            ),
        };

        Ok(Self {
            source,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Load a single configuration file, ignoring `BULLETIN_CONFIG_DIR`
    pub fn from_file(path: impl Into<PathBuf>, environment: AppEnvironment) -> Self {
        Self {
            source: Source::SingleFile(path.into()),
            environment,
        }
    }

    /// Load the layered files found in `dir` for the given environment
    pub fn from_dir(dir: impl Into<PathBuf>, environment: AppEnvironment) -> Self {
        Self {
            source: Source::Layered(dir.into()),
            environment,
        }
    }

    /// Override the environment detected from `BULLETIN_APP_ENV`
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load and validate the settings
    ///
    /// # Errors
    ///
    /// Returns an error if a required file is missing, parsing fails, or the
    /// merged settings do not validate.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings = self.load_unvalidated()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load the settings without validating them
    ///
    /// Used when further overrides (CLI arguments) are applied before
    /// validation.
    pub fn load_unvalidated(&self) -> Result<Settings, ConfigError> {
        self.build_config()?.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {e}"))
        })
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = match &self.source {
            Source::SingleFile(path) => Self::add_file_source(Config::builder(), path, true)?,
            Source::Layered(dir) => self.build_layered_config(Config::builder(), dir)?,
        };

        Self::add_env_source(builder)
            .build()
            .map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
        dir: &Path,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let builder = Self::add_file_source(builder, &dir.join("default.toml"), true)?;
        let builder = Self::add_file_source(
            builder,
            &dir.join(self.environment.config_file_name()),
            false,
        )?;
        Self::add_file_source(builder, &dir.join("local.toml"), false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        let name = path.to_str().ok_or_else(|| {
            ConfigError::ParseError(format!(
                "Configuration path is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        Ok(builder.add_source(File::new(name, FileFormat::Toml).required(required)))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}
