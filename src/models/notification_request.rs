//! Notification request records and audience resolution.
//!
//! A request is written by an administrator into the notification requests
//! collection and read exactly once by the dispatcher. Field values are taken
//! as-is; the only processing is the explicit defaulting in
//! [`NotificationRequest::resolve`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

pub const DEFAULT_TITLE: &str = "Notification";
pub const DEFAULT_BODY: &str = "";

// ============================================================================
// Topics and targets
// ============================================================================

/// Broadcast topic in the push-messaging backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Teachers,
    Students,
}

impl Topic {
    /// Every topic, in the order messages are produced
    pub const ALL: [Topic; 2] = [Topic::Teachers, Topic::Students];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Teachers => "teachers",
            Topic::Students => "students",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience selected by a request's `target` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Teachers,
    Students,
    /// Any other value; addresses no topic
    Unrecognized(String),
}

impl Target {
    /// Exact, case-sensitive match against the recognized values
    pub fn parse(value: &str) -> Self {
        match value {
            "all" => Target::All,
            "teachers" => Target::Teachers,
            "students" => Target::Students,
            other => Target::Unrecognized(other.to_string()),
        }
    }

    /// Whether messages for `topic` are produced for this target
    pub fn includes(&self, topic: Topic) -> bool {
        match self {
            Target::All => true,
            Target::Teachers => topic == Topic::Teachers,
            Target::Students => topic == Topic::Students,
            Target::Unrecognized(_) => false,
        }
    }

    pub fn topics(&self) -> Vec<Topic> {
        Topic::ALL
            .into_iter()
            .filter(|topic| self.includes(*topic))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::All => "all",
            Target::Teachers => "teachers",
            Target::Students => "students",
            Target::Unrecognized(value) => value,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Request record
// ============================================================================

/// Field values of a created notification request record
///
/// Missing or `null` fields are `None`. Numbers and booleans are kept in
/// their textual form; arrays and objects are treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,

    /// "all", "teachers" or "students"
    #[serde(default, deserialize_with = "lenient_text")]
    pub target: Option<String>,
}

/// A request after defaults have been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub title: String,
    pub body: String,
    pub target: Target,
}

impl NotificationRequest {
    /// Apply defaults. An empty string counts as missing for every field.
    pub fn resolve(&self) -> ResolvedRequest {
        ResolvedRequest {
            title: non_empty(&self.title).unwrap_or(DEFAULT_TITLE).to_string(),
            body: non_empty(&self.body).unwrap_or(DEFAULT_BODY).to_string(),
            target: non_empty(&self.target)
                .map(Target::parse)
                .unwrap_or(Target::All),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Read a record field as text.
///
/// `false` and numeric zero are falsy in the record store and count as
/// missing, like `null`. Other numbers and `true` keep their text form.
/// Arrays and objects count as missing.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(text)) => Some(text),
        Some(JsonValue::Number(number)) if number.as_f64() != Some(0.0) => {
            Some(number.to_string())
        }
        Some(JsonValue::Bool(true)) => Some(true.to_string()),
        _ => None,
    })
}
