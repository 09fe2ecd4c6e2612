//! Configuration settings structures for bulletin-rs
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};
use crate::services::notifications::PlatformHints;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "bulletin-rs".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/bulletin.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_api_base_url() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_messaging_timeout() -> u64 {
    10
}

fn default_android_channel_id() -> String {
    "high_importance_channel".to_string()
}

fn default_android_sound() -> String {
    "ring_notification".to_string()
}

fn default_apns_sound() -> String {
    "ring_notification.caf".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP listener receiving notification request events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound in seconds for handling one event, sends included
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

// ============================================================================
// Messaging Configuration
// ============================================================================

/// Push-messaging backend (FCM HTTP v1) configuration
///
/// Exactly one credential source is used: a static `access_token` when set,
/// otherwise the service account key at `credentials_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Firebase project id. Falls back to the service account's `project_id`.
    #[serde(default)]
    pub project_id: String,

    /// Path to a service account JSON key
    #[serde(default)]
    pub credentials_path: Option<String>,

    /// Pre-minted bearer token, mainly for emulators and local testing
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout for calls to the backend, in seconds
    #[serde(default = "default_messaging_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_android_channel_id")]
    pub android_channel_id: String,

    #[serde(default = "default_android_sound")]
    pub android_sound: String,

    #[serde(default = "default_apns_sound")]
    pub apns_sound: String,
}

impl MessagingConfig {
    pub fn platform_hints(&self) -> PlatformHints {
        PlatformHints {
            android_channel_id: self.android_channel_id.clone(),
            android_sound: self.android_sound.clone(),
            apns_sound: self.apns_sound.clone(),
        }
    }

    pub fn credentials_path(&self) -> Option<PathBuf> {
        self.credentials_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
    }

    pub fn static_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            credentials_path: None,
            access_token: None,
            api_base_url: default_api_base_url(),
            timeout_seconds: default_messaging_timeout(),
            android_channel_id: default_android_channel_id(),
            android_sound: default_android_sound(),
            apns_sound: default_apns_sound(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Colors are only emitted when stdout is a terminal
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// "full", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// One of "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime `LoggerConfig`
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = self.file.into_file_config()?;

        LoggerConfig::new(console, file, self.level)
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))?;

        Ok(FileConfig::new(
            self.enabled,
            PathBuf::from(self.path),
            self.append,
            format,
        ))
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub messaging: MessagingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_server_config() -> impl Strategy<Value = ServerConfig> {
        (
            prop_oneof![Just("127.0.0.1".to_string()), Just("0.0.0.0".to_string())],
            1u16..=65535u16,
            1u64..=300u64,
        )
            .prop_map(|(host, port, request_timeout)| ServerConfig {
                host,
                port,
                request_timeout,
            })
    }

    fn arb_logger_settings() -> impl Strategy<Value = LoggerSettings> {
        (
            prop_oneof![
                Just("trace".to_string()),
                Just("debug".to_string()),
                Just("info".to_string()),
                Just("warn".to_string()),
                Just("error".to_string()),
            ],
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            prop_oneof![
                Just("json".to_string()),
                Just("full".to_string()),
                Just("compact".to_string()),
            ],
        )
            .prop_map(|(level, console, colored, file, format)| LoggerSettings {
                level,
                console: ConsoleSettings {
                    enabled: console,
                    colored,
                },
                file: FileSettings {
                    enabled: file,
                    format,
                    ..FileSettings::default()
                },
            })
    }

    fn arb_messaging_config() -> impl Strategy<Value = MessagingConfig> {
        (
            "[a-z][a-z0-9-]{3,20}",
            proptest::option::of(Just("secrets/service-account.json".to_string())),
            proptest::option::of("[A-Za-z0-9._-]{16,40}"),
            1u64..=120u64,
            "[a-z_]{3,30}",
        )
            .prop_map(
                |(project_id, credentials_path, access_token, timeout_seconds, channel)| {
                    MessagingConfig {
                        project_id,
                        credentials_path,
                        access_token,
                        timeout_seconds,
                        android_channel_id: channel,
                        ..MessagingConfig::default()
                    }
                },
            )
    }

    fn arb_settings() -> impl Strategy<Value = Settings> {
        (
            arb_server_config(),
            arb_logger_settings(),
            arb_messaging_config(),
        )
            .prop_map(|(server, logger, messaging)| Settings {
                application: ApplicationConfig::default(),
                server,
                logger,
                messaging,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_settings_survive_toml(settings in arb_settings()) {
            let encoded = toml::to_string(&settings).expect("Settings should serialize to TOML");
            let decoded: Settings = toml::from_str(&encoded).expect("TOML should deserialize back");
            prop_assert_eq!(settings, decoded);
        }
    }

    #[test]
    fn test_messaging_defaults_match_mobile_clients() {
        let config = MessagingConfig::default();
        assert_eq!(config.api_base_url, "https://fcm.googleapis.com");
        assert_eq!(config.android_channel_id, "high_importance_channel");
        assert_eq!(config.android_sound, "ring_notification");
        assert_eq!(config.apns_sound, "ring_notification.caf");
        assert_eq!(config.timeout_seconds, 10);
    }

    #[test]
    fn test_platform_hints_from_config() {
        let config = MessagingConfig {
            android_sound: "chime".to_string(),
            ..MessagingConfig::default()
        };
        let hints = config.platform_hints();
        assert_eq!(hints.android_sound, "chime");
        assert_eq!(hints.apns_sound, "ring_notification.caf");
    }

    #[test]
    fn test_blank_credentials_are_ignored() {
        let config = MessagingConfig {
            credentials_path: Some("  ".to_string()),
            access_token: Some(String::new()),
            ..MessagingConfig::default()
        };
        assert!(config.credentials_path().is_none());
        assert!(config.static_token().is_none());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(config.address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings: Settings = toml::from_str("").expect("empty document is valid");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.logger.level, "info");
        assert!(!settings.logger.file.enabled);
        assert_eq!(settings.application.name, "bulletin-rs");
    }

    #[test]
    fn test_into_logger_config_rejects_unknown_format() {
        let settings = LoggerSettings {
            file: FileSettings {
                format: "xml".to_string(),
                ..FileSettings::default()
            },
            ..LoggerSettings::default()
        };
        let err = settings.into_logger_config().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { field, .. } if field == "logger.file.format"));
    }
}
