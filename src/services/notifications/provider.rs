//! Push provider abstraction.
//!
//! The dispatcher only knows this trait; the FCM client is one
//! implementation and tests substitute recording or failing providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::PushMessage;
use crate::error::AppResult;

/// Backend acknowledgement for one accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Backend-assigned message name, e.g. `projects/p/messages/0:123`
    pub message_id: String,
    pub duration_ms: u64,
}

/// Sends messages addressed to a topic
///
/// All providers must be Send + Sync for use in async contexts.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Sends one message
    ///
    /// # Returns
    /// The backend receipt, or `AppError::Delivery` when the backend could not
    /// be reached or rejected the message
    async fn send(&self, message: &PushMessage) -> AppResult<SendReceipt>;

    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Checks provider configuration at startup (default no-op)
    async fn validate_config(&self) -> AppResult<()> {
        Ok(())
    }
}
