//! Application state for Axum web framework.
//!
//! Contains shared services that are accessible across all request handlers.

use crate::config::{MessagingConfig, Settings};
use crate::error::AppResult;
use crate::services::Services;

/// Application state containing all shared services.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since services use `Arc` internally.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
}

impl AppState {
    /// Creates the state from loaded settings.
    ///
    /// # Example
    /// ```ignore
    /// let settings = ConfigLoader::new()?.load()?;
    /// let state = AppState::from_settings(&settings).await?;
    /// ```
    pub async fn from_settings(settings: &Settings) -> AppResult<Self> {
        Self::from_messaging(&settings.messaging).await
    }

    pub async fn from_messaging(config: &MessagingConfig) -> AppResult<Self> {
        let services = Services::from_config(config).await?;
        Ok(Self::new(services))
    }

    pub fn new(services: Services) -> Self {
        Self { services }
    }
}
