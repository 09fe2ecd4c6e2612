//! FCM HTTP v1 push provider.
//!
//! Sends topic messages through the `projects.messages.send` endpoint.
//!
//! API reference: https://firebase.google.com/docs/reference/fcm/rest/v1/projects.messages/send

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::client::build_http_client;
use super::credentials::{
    AccessTokenSource, ServiceAccountKey, ServiceAccountTokenSource, StaticToken,
};
use super::message::PushMessage;
use super::provider::{PushProvider, SendReceipt};
use crate::config::MessagingConfig;
use crate::error::{AppError, AppResult};

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a PushMessage,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Push provider backed by Firebase Cloud Messaging
///
/// # Example
/// ```ignore
/// let tokens = Arc::new(StaticToken::new("ya29..."));
/// let provider = FcmProvider::new(client, "https://fcm.googleapis.com", "school-app", tokens);
/// let receipt = provider.send(&message).await?;
/// ```
pub struct FcmProvider {
    client: reqwest::Client,
    project_id: String,
    endpoint: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl FcmProvider {
    pub fn new(
        client: reqwest::Client,
        api_base_url: &str,
        project_id: &str,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        let endpoint = format!(
            "{}/v1/projects/{}/messages:send",
            api_base_url.trim_end_matches('/'),
            project_id
        );

        Self {
            client,
            project_id: project_id.to_string(),
            endpoint,
            tokens,
        }
    }

    /// Build the provider and its credential source from configuration
    ///
    /// A static access token takes precedence over the service account key.
    /// An empty `project_id` is taken from the key file.
    pub fn from_config(config: &MessagingConfig) -> AppResult<Self> {
        let client = build_http_client(config.timeout_seconds)?;

        if let Some(token) = config.static_token() {
            let tokens: Arc<dyn AccessTokenSource> = Arc::new(StaticToken::new(token));
            return Ok(Self::new(
                client,
                &config.api_base_url,
                &config.project_id,
                tokens,
            ));
        }

        let path = config
            .credentials_path()
            .ok_or_else(|| AppError::Validation {
                field: "messaging.credentials_path".to_string(),
                reason: "No credential source configured".to_string(),
            })?;
        let key = ServiceAccountKey::from_file(&path)?;

        let project_id = if config.project_id.trim().is_empty() {
            key.project_id.clone().ok_or_else(|| AppError::Validation {
                field: "messaging.project_id".to_string(),
                reason: format!(
                    "Not configured and missing from service account key '{}'",
                    path.display()
                ),
            })?
        } else {
            config.project_id.clone()
        };

        let tokens: Arc<dyn AccessTokenSource> =
            Arc::new(ServiceAccountTokenSource::new(key, client.clone())?);

        Ok(Self::new(client, &config.api_base_url, &project_id, tokens))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credential_source(&self) -> &'static str {
        self.tokens.name()
    }

    fn delivery_error(message: &PushMessage, status: Option<u16>, detail: String) -> AppError {
        AppError::Delivery {
            topic: message.topic.clone(),
            status,
            message: detail,
        }
    }
}

/// Prefer the backend's `error.message`, falling back to the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl PushProvider for FcmProvider {
    async fn send(&self, message: &PushMessage) -> AppResult<SendReceipt> {
        let start = Instant::now();

        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&SendRequest { message })
            .send()
            .await
            .map_err(|e| Self::delivery_error(message, None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::delivery_error(message, Some(status.as_u16()), e.to_string()))?;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !status.is_success() {
            return Err(Self::delivery_error(
                message,
                Some(status.as_u16()),
                error_detail(&body),
            ));
        }

        let accepted: SendResponse = serde_json::from_str(&body).map_err(|e| {
            Self::delivery_error(
                message,
                Some(status.as_u16()),
                format!("Unexpected response body: {e}"),
            )
        })?;

        tracing::debug!(
            topic = %message.topic,
            message_id = %accepted.name,
            duration_ms,
            "Message accepted by FCM"
        );

        Ok(SendReceipt {
            message_id: accepted.name,
            duration_ms,
        })
    }

    fn name(&self) -> &'static str {
        "fcm"
    }

    /// Checks that:
    /// - project id is not empty
    /// - the send endpoint is a valid http(s) URL
    async fn validate_config(&self) -> AppResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(AppError::Validation {
                field: "messaging.project_id".to_string(),
                reason: "Project id cannot be empty".to_string(),
            });
        }

        let url = Url::parse(&self.endpoint).map_err(|_| AppError::Validation {
            field: "messaging.api_base_url".to_string(),
            reason: "Invalid URL format".to_string(),
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(AppError::Validation {
                field: "messaging.api_base_url".to_string(),
                reason: "URL must use http or https protocol".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Topic;
    use crate::services::notifications::PlatformHints;
    use crate::services::notifications::client::test_support::{local_client, spawn_server};
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn accept(
        State(captured): State<Captured>,
        Path(project): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.requests.lock().unwrap().push((project.clone(), auth, body));
        Json(json!({ "name": format!("projects/{project}/messages/0:1500415314455276") }))
    }

    fn message(topic: Topic) -> PushMessage {
        PushMessage::new(topic, "Assembly", "Moved to 10am", &PlatformHints::default())
    }

    fn provider(base_url: &str) -> FcmProvider {
        FcmProvider::new(
            local_client(),
            base_url,
            "school-app",
            Arc::new(StaticToken::new("ya29.test")),
        )
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = provider("https://fcm.googleapis.com/");
        assert_eq!(
            provider.endpoint(),
            "https://fcm.googleapis.com/v1/projects/school-app/messages:send"
        );
        assert_eq!(provider.credential_source(), "static");
    }

    #[test]
    fn test_error_detail_prefers_backend_message() {
        let body = r#"{"error":{"code":400,"message":"Invalid topic name","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_detail(body), "Invalid topic name");
        assert_eq!(error_detail("upstream timeout"), "upstream timeout");
    }

    #[tokio::test]
    async fn test_validate_config() {
        assert!(provider("https://fcm.googleapis.com").validate_config().await.is_ok());

        let unnamed = FcmProvider::new(
            local_client(),
            "https://fcm.googleapis.com",
            "",
            Arc::new(StaticToken::new("ya29.test")),
        );
        assert!(matches!(
            unnamed.validate_config().await,
            Err(AppError::Validation { field, .. }) if field == "messaging.project_id"
        ));
    }

    #[tokio::test]
    async fn test_send_posts_message_with_bearer_token() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/projects/{project}/messages:send", post(accept))
            .with_state(captured.clone());
        let base_url = spawn_server(router).await;

        let receipt = provider(&base_url).send(&message(Topic::Teachers)).await.unwrap();
        assert_eq!(
            receipt.message_id,
            "projects/school-app/messages/0:1500415314455276"
        );
        assert!(receipt.duration_ms < 60_000);

        let requests = captured.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (project, auth, body) = &requests[0];
        assert_eq!(project, "school-app");
        assert_eq!(auth.as_deref(), Some("Bearer ya29.test"));
        assert_eq!(body["message"]["topic"], "teachers");
        assert_eq!(body["message"]["notification"]["title"], "Assembly");
        assert_eq!(
            body["message"]["android"]["notification"]["channelId"],
            "high_importance_channel"
        );
        assert_eq!(
            body["message"]["apns"]["payload"]["aps"]["sound"],
            "ring_notification.caf"
        );
    }

    #[tokio::test]
    async fn test_send_maps_backend_rejection() {
        let router = Router::new().route(
            "/v1/projects/{project}/messages:send",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": { "code": 400, "message": "Invalid value at 'message.topic'", "status": "INVALID_ARGUMENT" }
                    })),
                )
            }),
        );
        let base_url = spawn_server(router).await;

        let err = provider(&base_url).send(&message(Topic::Students)).await.unwrap_err();
        match err {
            AppError::Delivery {
                topic,
                status,
                message,
            } => {
                assert_eq!(topic, "students");
                assert_eq!(status, Some(400));
                assert_eq!(message, "Invalid value at 'message.topic'");
            }
            other => panic!("Expected Delivery error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_maps_transport_failure() {
        // Bind and drop a listener so the port is very likely closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider(&format!("http://{addr}"))
            .send(&message(Topic::Teachers))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Delivery { status: None, ref topic, .. } if topic == "teachers"
        ));
    }

    #[test]
    fn test_from_config_with_static_token() {
        let config = MessagingConfig {
            project_id: "school-app".to_string(),
            access_token: Some("ya29.static".to_string()),
            ..MessagingConfig::default()
        };
        let provider = FcmProvider::from_config(&config).unwrap();
        assert_eq!(provider.credential_source(), "static");
        assert_eq!(
            provider.endpoint(),
            "https://fcm.googleapis.com/v1/projects/school-app/messages:send"
        );
    }

    #[test]
    fn test_from_config_takes_project_from_key_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let key_path = dir.path().join("service-account.json");
        let key = json!({
            "project_id": "school-from-key",
            "private_key": include_str!("fixtures/test_service_account.key.pem"),
            "client_email": "relay@school-from-key.iam.gserviceaccount.com",
        });
        std::fs::write(&key_path, key.to_string()).unwrap();

        let config = MessagingConfig {
            credentials_path: Some(key_path.to_string_lossy().into_owned()),
            ..MessagingConfig::default()
        };
        let provider = FcmProvider::from_config(&config).unwrap();
        assert_eq!(provider.credential_source(), "service_account");
        assert!(provider.endpoint().contains("/projects/school-from-key/"));
    }

    #[test]
    fn test_from_config_without_credentials() {
        let config = MessagingConfig::default();
        assert!(matches!(
            FcmProvider::from_config(&config),
            Err(AppError::Validation { .. })
        ));
    }
}
