//! Dispatch command handler
//!
//! Handles one notification request record outside the HTTP server, for
//! manual resends and for trigger runtimes that invoke a process per event.

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::models::NotificationRequest;
use crate::services::Services;

/// Handler for the dispatch command
pub struct DispatchCommandHandler {
    config: Settings,
}

impl DispatchCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Read the record and handle it once
    ///
    /// # Arguments
    /// * `request_id` - Identifier of the record
    /// * `file` - Record JSON file; stdin when `None`
    ///
    /// # Errors
    /// - Unreadable input or a body that is not a JSON object
    /// - Credential loading errors
    ///
    /// Delivery failures are logged by the dispatcher and do not fail the command.
    pub async fn execute(&self, request_id: &str, file: Option<&Path>) -> AppResult<()> {
        let request = Self::load_request(file).await?;
        let services = Services::from_config(&self.config.messaging).await?;
        Self::run(&services, request_id, &request).await;
        Ok(())
    }

    pub async fn run(services: &Services, request_id: &str, request: &NotificationRequest) {
        tracing::info!(request_id, "Dispatching notification request");
        services.notifications.handle(request_id, request).await;
    }

    /// Read and parse the record from `file`, or stdin when `None`
    pub async fn load_request(file: Option<&Path>) -> AppResult<NotificationRequest> {
        let raw = match file {
            Some(path) => Self::read_file(path).await?,
            None => Self::read_stdin().await?,
        };
        Self::parse_request(&raw)
    }

    async fn read_file(path: &Path) -> AppResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::BadRequest {
                message: format!("Cannot read request file '{}': {e}", path.display()),
            })
    }

    async fn read_stdin() -> AppResult<String> {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .map_err(|e| AppError::BadRequest {
                message: format!("Cannot read request from stdin: {e}"),
            })?;
        Ok(raw)
    }

    /// Parse the record's fields; the body must be a JSON object
    pub fn parse_request(raw: &str) -> AppResult<NotificationRequest> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| AppError::BadRequest {
                message: format!("Request is not valid JSON: {e}"),
            })?;

        if !value.is_object() {
            return Err(AppError::BadRequest {
                message: "Request must be a JSON object".to_string(),
            });
        }

        serde_json::from_value(value).map_err(|e| AppError::BadRequest {
            message: format!("Request has an unexpected shape: {e}"),
        })
    }
}
