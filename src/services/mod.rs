//! Service layer.
//!
//! Services are built once at startup from configuration and shared by the
//! HTTP handlers and the CLI.

pub mod notifications;

pub use notifications::NotificationDispatcher;

use std::sync::Arc;

use crate::config::MessagingConfig;
use crate::error::AppResult;
use notifications::{FcmProvider, PushProvider};

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since providers are shared behind `Arc`.
#[derive(Clone)]
pub struct Services {
    pub notifications: NotificationDispatcher,
}

impl Services {
    /// Build services from messaging configuration
    ///
    /// Loads credentials and checks the provider configuration; any failure
    /// here is a startup error.
    pub async fn from_config(config: &MessagingConfig) -> AppResult<Self> {
        let provider = FcmProvider::from_config(config)?;
        provider.validate_config().await?;

        tracing::info!(
            provider = provider.name(),
            endpoint = %provider.endpoint(),
            credentials = provider.credential_source(),
            "Push provider configured"
        );

        Ok(Self::with_provider(Arc::new(provider), config))
    }

    /// Build services around an existing provider
    pub fn with_provider(provider: Arc<dyn PushProvider>, config: &MessagingConfig) -> Self {
        Self {
            notifications: NotificationDispatcher::new(provider, config.platform_hints()),
        }
    }
}
