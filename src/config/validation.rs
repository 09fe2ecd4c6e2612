//! Configuration validation logic
//!
//! Each section validates itself and reports the first problem found,
//! qualified by its dotted key so the operator can find it in the TOML.

use crate::config::error::ConfigError;
use crate::config::settings::{FileSettings, LoggerSettings, MessagingConfig, ServerConfig, Settings};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.host",
                "Host address cannot be empty.",
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl MessagingConfig {
    /// Validate messaging configuration
    ///
    /// The project id may be left empty when a service account key is
    /// configured; it is then taken from the key file at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.static_token().is_none() && self.credentials_path().is_none() {
            return Err(ConfigError::validation(
                "messaging.credentials_path",
                "Either messaging.credentials_path or messaging.access_token must be set.",
            ));
        }

        if self.static_token().is_some() && self.project_id.trim().is_empty() {
            return Err(ConfigError::validation(
                "messaging.project_id",
                "A project id is required when using a static access token.",
            ));
        }

        if !(self.api_base_url.starts_with("https://") || self.api_base_url.starts_with("http://"))
        {
            return Err(ConfigError::ValidationError {
                field: "messaging.api_base_url".to_string(),
                message: format!(
                    "Invalid API base URL '{}'. Expected an http:// or https:// URL.",
                    self.api_base_url
                ),
            });
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "messaging.timeout_seconds",
                "Timeout must be greater than 0 seconds.",
            ));
        }

        if self.android_channel_id.trim().is_empty() {
            return Err(ConfigError::validation(
                "messaging.android_channel_id",
                "Android notification channel id cannot be empty.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validate all sections, returning the first error encountered
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.messaging.validate()?;
        Ok(())
    }
}
