//! Health check DTOs for API responses.

use serde::{Deserialize, Serialize};

/// Health check response structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Application version
    pub version: String,
    /// Timestamp of the health check (RFC 3339)
    pub timestamp: String,
    /// Push provider the service dispatches through
    pub provider: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}
