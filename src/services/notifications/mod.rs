//! Push notification delivery.
//!
//! `NotificationDispatcher` turns a notification request into topic messages
//! and sends them through a `PushProvider`. `FcmProvider` is the production
//! provider; it authenticates with an `AccessTokenSource`.

mod client;
mod credentials;
mod dispatcher;
mod fcm_provider;
mod message;
mod provider;

pub use client::build_http_client;
pub use credentials::{
    AccessTokenSource, ServiceAccountKey, ServiceAccountTokenSource, StaticToken,
};
pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use fcm_provider::FcmProvider;
pub use message::{PlatformHints, PushMessage, build_messages};
pub use provider::{PushProvider, SendReceipt};

#[cfg(test)]
pub(crate) use dispatcher::test_support::RecordingProvider;
