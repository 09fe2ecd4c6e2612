use crate::config::error::ConfigError;
use thiserror::Error;

/// Application-wide error type that represents all possible errors in the system.
///
/// Delivery failures carry the topic they were addressed to so that the
/// dispatcher can log them with enough context to correlate with the
/// messaging backend's own logs.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Credentials could not be loaded or exchanged for an access token
    #[error("Credentials error: {message}")]
    Credentials { message: String },

    /// The messaging backend rejected or never received a message
    #[error("Delivery to topic '{topic}' failed{}: {message}", status_suffix(.status))]
    Delivery {
        topic: String,
        status: Option<u16>,
        message: String,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Stable machine-readable code used in API error responses
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::BadRequest { .. } => "BAD_REQUEST",
            AppError::Configuration { .. } => "CONFIGURATION_ERROR",
            AppError::Credentials { .. } => "CREDENTIALS_ERROR",
            AppError::Delivery { .. } => "DELIVERY_FAILED",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "configuration".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::new(error),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {code}"))
        .unwrap_or_default()
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_display_with_status() {
        let err = AppError::Delivery {
            topic: "teachers".to_string(),
            status: Some(400),
            message: "Invalid payload".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Delivery to topic 'teachers' failed with status 400: Invalid payload"
        );
        assert_eq!(err.code(), "DELIVERY_FAILED");
    }

    #[test]
    fn test_delivery_error_display_without_status() {
        let err = AppError::Delivery {
            topic: "students".to_string(),
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Delivery to topic 'students' failed: connection refused"
        );
    }

    #[test]
    fn test_config_error_conversion_keeps_field() {
        let err: AppError = ConfigError::validation("messaging.project_id", "missing").into();
        match err {
            AppError::Configuration { key, .. } => assert_eq!(key, "messaging.project_id"),
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_anyhow_conversion_is_internal() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
