//! Notification request dispatcher.
//!
//! Turns a created notification request into topic messages and hands them
//! to the configured push provider. Delivery failures are logged, never
//! returned: the caller that created the request has already moved on.

use std::sync::Arc;

use futures::future::join_all;

use super::message::{PlatformHints, PushMessage, build_messages};
use super::provider::{PushProvider, SendReceipt};
use crate::error::AppError;
use crate::models::NotificationRequest;

/// Result of sending one batch of messages
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub receipts: Vec<SendReceipt>,
    pub failures: Vec<AppError>,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Dispatches notification requests to a push provider
///
/// Cloning is cheap; the provider is shared behind an `Arc`.
#[derive(Clone)]
pub struct NotificationDispatcher {
    provider: Arc<dyn PushProvider>,
    hints: PlatformHints,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn PushProvider>, hints: PlatformHints) -> Self {
        Self { provider, hints }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn hints(&self) -> &PlatformHints {
        &self.hints
    }

    /// Handle one created notification request
    ///
    /// # Arguments
    /// * `request_id` - Identifier of the created record, used for log correlation
    /// * `request` - The record's field values
    pub async fn handle(&self, request_id: &str, request: &NotificationRequest) {
        let resolved = request.resolve();
        let messages = build_messages(&resolved, &self.hints);

        if messages.is_empty() {
            tracing::debug!(
                request_id,
                notification_target = %resolved.target,
                "No topics match notification target, nothing to send"
            );
            return;
        }

        let outcome = self.dispatch(&messages).await;

        if let Some(first) = outcome.failures.first() {
            tracing::error!(
                request_id,
                provider = self.provider.name(),
                error = %first,
                failed = outcome.failures.len(),
                attempted = messages.len(),
                "Error sending notifications"
            );
            return;
        }

        let message_ids: Vec<&str> = outcome
            .receipts
            .iter()
            .map(|receipt| receipt.message_id.as_str())
            .collect();
        tracing::info!(
            request_id,
            provider = self.provider.name(),
            notification_target = %resolved.target,
            message_ids = ?message_ids,
            "Notifications sent for request"
        );
    }

    /// Send all messages concurrently and wait for every one of them
    ///
    /// A failed send does not cancel the others.
    pub async fn dispatch(&self, messages: &[PushMessage]) -> DispatchOutcome {
        let results = join_all(messages.iter().map(|message| self.provider.send(message))).await;

        let mut outcome = DispatchOutcome::default();
        for result in results {
            match result {
                Ok(receipt) => outcome.receipts.push(receipt),
                Err(err) => outcome.failures.push(err),
            }
        }
        outcome
    }
}
