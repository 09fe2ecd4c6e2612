//! Access tokens for the messaging API.
//!
//! Two sources are supported:
//! - [`StaticToken`]: a bearer token minted elsewhere (emulators, CI)
//! - [`ServiceAccountTokenSource`]: the OAuth2 JWT bearer grant for a Google
//!   service account key, with the resulting token cached until shortly
//!   before it expires

use std::path::Path;

use async_trait::async_trait;
use jiff::Timestamp;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// OAuth2 scope granting access to the messaging send API
pub const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each signed assertion
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Cached tokens are refreshed this many seconds before they expire
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Supplies bearer tokens for outgoing requests
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> AppResult<String>;

    fn name(&self) -> &'static str;
}

// ============================================================================
// Static token
// ============================================================================

pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> AppResult<String> {
        Ok(self.token.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

// ============================================================================
// Service account
// ============================================================================

/// Fields used from a Google service account JSON key
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json).map_err(|e| AppError::Credentials {
            message: format!("Invalid service account key: {e}"),
        })
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| AppError::Credentials {
            message: format!(
                "Cannot read service account key '{}': {e}",
                path.display()
            ),
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    /// Unix seconds
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - REFRESH_MARGIN_SECS > now
    }
}

/// Exchanges signed assertions for access tokens and caches the result
///
/// The cache mutex is held across the exchange so that concurrent callers
/// wait for a single refresh instead of each minting a token.
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    cache: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, client: reqwest::Client) -> AppResult<Self> {
        let encoding_key =
            EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
                AppError::Credentials {
                    message: format!("Invalid private key for {}: {e}", key.client_email),
                }
            })?;

        Ok(Self {
            key,
            encoding_key,
            client,
            cache: Mutex::new(None),
        })
    }

    fn sign_assertion(&self, now: i64) -> AppResult<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: MESSAGING_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&header, &claims, &self.encoding_key).map_err(|e| AppError::Credentials {
            message: format!("Failed to sign token assertion: {e}"),
        })
    }

    async fn exchange(&self, now: i64) -> AppResult<CachedToken> {
        let assertion = self.sign_assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Credentials {
                message: format!("Token request to {} failed: {e}", self.key.token_uri),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Credentials {
                message: format!("Token endpoint returned {}: {body}", status.as_u16()),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| AppError::Credentials {
            message: format!("Malformed token response: {e}"),
        })?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Obtained messaging access token"
        );

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> AppResult<String> {
        let mut cache = self.cache.lock().await;
        let now = Timestamp::now().as_second();

        if let Some(cached) = cache.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(cached.value.clone());
        }

        let fresh = self.exchange(now).await?;
        let value = fresh.value.clone();
        *cache = Some(fresh);
        Ok(value)
    }

    fn name(&self) -> &'static str {
        "service_account"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifications::client::test_support::{local_client, spawn_server};
    use axum::{Form, Json, Router, extract::State, http::StatusCode, routing::post};
    use jsonwebtoken::{DecodingKey, Validation, decode};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PRIVATE_KEY: &str = include_str!("fixtures/test_service_account.key.pem");
    const PUBLIC_KEY: &str = include_str!("fixtures/test_service_account.pub.pem");
    const CLIENT_EMAIL: &str = "relay@school-app.iam.gserviceaccount.com";

    fn key_json(token_uri: &str) -> String {
        json!({
            "type": "service_account",
            "project_id": "school-app",
            "private_key_id": "key-1",
            "private_key": PRIVATE_KEY,
            "client_email": CLIENT_EMAIL,
            "token_uri": token_uri,
        })
        .to_string()
    }

    #[derive(Clone)]
    struct TokenEndpoint {
        calls: Arc<AtomicUsize>,
        expires_in: i64,
        token_uri: Arc<std::sync::Mutex<String>>,
    }

    async fn issue_token(
        State(endpoint): State<TokenEndpoint>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        if form.get("grant_type").map(String::as_str) != Some(JWT_BEARER_GRANT) {
            return Err(StatusCode::BAD_REQUEST);
        }
        let assertion = form.get("assertion").ok_or(StatusCode::BAD_REQUEST)?;

        let audience = endpoint.token_uri.lock().unwrap().clone();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        let decoding_key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
        let claims = decode::<AssertionClaims>(assertion, &decoding_key, &validation)
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .claims;
        if claims.iss != CLIENT_EMAIL || claims.scope != MESSAGING_SCOPE {
            return Err(StatusCode::FORBIDDEN);
        }

        let n = endpoint.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Json(json!({
            "access_token": format!("ya29.token-{n}"),
            "expires_in": endpoint.expires_in,
            "token_type": "Bearer"
        })))
    }

    async fn spawn_token_endpoint(expires_in: i64) -> (TokenEndpoint, String) {
        let endpoint = TokenEndpoint {
            calls: Arc::new(AtomicUsize::new(0)),
            expires_in,
            token_uri: Arc::new(std::sync::Mutex::new(String::new())),
        };
        let router = Router::new()
            .route("/token", post(issue_token))
            .with_state(endpoint.clone());
        let token_uri = format!("{}/token", spawn_server(router).await);
        *endpoint.token_uri.lock().unwrap() = token_uri.clone();
        (endpoint, token_uri)
    }

    #[test]
    fn test_key_from_json_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            &json!({ "client_email": CLIENT_EMAIL, "private_key": PRIVATE_KEY }).to_string(),
        )
        .unwrap();
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
        assert!(key.project_id.is_none());
    }

    #[test]
    fn test_key_debug_hides_private_key() {
        let key = ServiceAccountKey::from_json(&key_json("https://example.test/token")).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains(CLIENT_EMAIL));
        assert!(!debug.contains("PRIVATE KEY"));
    }

    #[test]
    fn test_key_from_missing_file() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/key.json")).unwrap_err();
        assert!(matches!(err, AppError::Credentials { .. }));
    }

    #[test]
    fn test_invalid_private_key_is_rejected() {
        let mut key = ServiceAccountKey::from_json(&key_json("https://example.test/token")).unwrap();
        key.private_key = "not a key".to_string();
        let result = ServiceAccountTokenSource::new(key, local_client());
        assert!(matches!(result, Err(AppError::Credentials { .. })));
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken::new("ya29.fixed");
        assert_eq!(source.access_token().await.unwrap(), "ya29.fixed");
        assert_eq!(source.name(), "static");
    }

    #[tokio::test]
    async fn test_exchanges_signed_assertion_and_caches() {
        let (endpoint, token_uri) = spawn_token_endpoint(3600).await;
        let key = ServiceAccountKey::from_json(&key_json(&token_uri)).unwrap();
        let source = ServiceAccountTokenSource::new(key, local_client()).unwrap();

        assert_eq!(source.access_token().await.unwrap(), "ya29.token-1");
        assert_eq!(source.access_token().await.unwrap(), "ya29.token-1");
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let (endpoint, token_uri) = spawn_token_endpoint(3600).await;
        let key = ServiceAccountKey::from_json(&key_json(&token_uri)).unwrap();
        let source = ServiceAccountTokenSource::new(key, local_client()).unwrap();

        let (first, second) = tokio::join!(source.access_token(), source.access_token());
        assert_eq!(first.unwrap(), "ya29.token-1");
        assert_eq!(second.unwrap(), "ya29.token-1");
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refreshes_tokens_inside_margin() {
        let (endpoint, token_uri) = spawn_token_endpoint(REFRESH_MARGIN_SECS).await;
        let key = ServiceAccountKey::from_json(&key_json(&token_uri)).unwrap();
        let source = ServiceAccountTokenSource::new(key, local_client()).unwrap();

        assert_eq!(source.access_token().await.unwrap(), "ya29.token-1");
        assert_eq!(source.access_token().await.unwrap(), "ya29.token-2");
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_token_endpoint_rejection() {
        let router = Router::new().route(
            "/token",
            post(|| async { (StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#) }),
        );
        let token_uri = format!("{}/token", spawn_server(router).await);
        let key = ServiceAccountKey::from_json(&key_json(&token_uri)).unwrap();
        let source = ServiceAccountTokenSource::new(key, local_client()).unwrap();

        match source.access_token().await {
            Err(AppError::Credentials { message }) => {
                assert!(message.contains("400"));
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("Expected Credentials error, got {other:?}"),
        }
    }
}
