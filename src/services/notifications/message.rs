//! Push message payloads.
//!
//! Serialized in the FCM HTTP v1 `Message` JSON shape. Every message
//! produced for one request shares the same visible content and platform
//! hints and differs only in its topic.

use serde::{Deserialize, Serialize};

use crate::models::{ResolvedRequest, Topic};

/// Platform-specific delivery hints applied to every message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformHints {
    /// Android notification channel the message is posted to
    pub android_channel_id: String,
    /// Android sound resource name, without extension
    pub android_sound: String,
    /// iOS sound file bundled with the app
    pub apns_sound: String,
}

impl Default for PlatformHints {
    fn default() -> Self {
        Self {
            android_channel_id: "high_importance_channel".to_string(),
            android_sound: "ring_notification".to_string(),
            apns_sound: "ring_notification.caf".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub topic: String,
    pub notification: Notification,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

/// Visible notification content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidNotification {
    pub channel_id: String,
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aps {
    pub sound: String,
}

impl PushMessage {
    pub fn new(topic: Topic, title: &str, body: &str, hints: &PlatformHints) -> Self {
        Self {
            topic: topic.as_str().to_string(),
            notification: Notification {
                title: title.to_string(),
                body: body.to_string(),
            },
            android: AndroidConfig {
                notification: AndroidNotification {
                    channel_id: hints.android_channel_id.clone(),
                    sound: hints.android_sound.clone(),
                },
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        sound: hints.apns_sound.clone(),
                    },
                },
            },
        }
    }
}

/// Build the outgoing set for a request: one message per addressed topic
///
/// Returns an empty set for an unrecognized target.
pub fn build_messages(request: &ResolvedRequest, hints: &PlatformHints) -> Vec<PushMessage> {
    request
        .target
        .topics()
        .into_iter()
        .map(|topic| PushMessage::new(topic, &request.title, &request.body, hints))
        .collect()
}
