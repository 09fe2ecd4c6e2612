//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::config::{Environment, Settings};
use crate::error::{AppError, AppResult};
use crate::server::Server;
use crate::services::Services;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Execute the serve command
    ///
    /// # Arguments
    /// * `dry_run` - If true, validates configuration and credentials, then exits
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Credential loading errors
    /// - Server startup errors (if not dry-run)
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only().await;
        }

        Server::new(self.config.clone(), self.environment)
            .run()
            .await
            .map_err(AppError::from)
    }

    /// Validate configuration and build the push provider without serving
    ///
    /// Loading the provider reads the service account key, so a missing or
    /// malformed key fails the dry run. No network request is made.
    pub async fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        println!("✓ Configuration is valid");
        println!("✓ Environment: {}", self.environment);
        println!("✓ Server would bind to: {}", self.config.server.address());

        let services = Services::from_config(&self.config.messaging).await?;
        println!(
            "✓ Push provider '{}' is configured",
            services.notifications.provider_name()
        );
        println!("✓ Logger configuration is valid");

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MessagingConfig;

    fn valid_config() -> Settings {
        Settings {
            messaging: MessagingConfig {
                project_id: "school-app".to_string(),
                access_token: Some("ya29.test".to_string()),
                ..MessagingConfig::default()
            },
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_serve_handler_new() {
        let config = valid_config();
        let handler = ServeCommandHandler::new(config.clone(), Environment::Test);
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run() {
        let handler = ServeCommandHandler::new(valid_config(), Environment::Test);
        assert!(handler.execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run_invalid_config() {
        let mut config = valid_config();
        config.server.port = 0;
        let handler = ServeCommandHandler::new(config, Environment::Test);
        assert!(handler.execute(true).await.is_err());
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run_missing_key_file() {
        let mut config = valid_config();
        config.messaging.access_token = None;
        config.messaging.credentials_path = Some("/nonexistent/service-account.json".to_string());
        let handler = ServeCommandHandler::new(config, Environment::Test);

        let err = handler.execute(true).await.unwrap_err();
        assert!(matches!(err, AppError::Credentials { .. }));
    }
}
