use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Build the HTTP client shared by the FCM provider and the token source
///
/// Built once at startup from configuration and cloned into each user;
/// `reqwest::Client` is reference counted, so clones share one pool.
///
/// # Features
/// - **Timeouts**: `timeout_seconds` per request, connect capped at 10s
/// - **Connection pooling**: idle connections kept for 90s
/// - **Compression**: gzip responses accepted
pub fn build_http_client(timeout_seconds: u64) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(timeout_seconds.min(10)))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .gzip(true)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal {
            source: anyhow::anyhow!("Failed to build HTTP client: {e}"),
        })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(build_http_client(10).is_ok());
        assert!(build_http_client(1).is_ok());
    }
}
