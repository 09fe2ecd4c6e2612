//! Notification request DTOs.

use serde::{Deserialize, Serialize};

/// Acknowledgement returned once a notification request has been handled
///
/// Delivery failures are not reported here; they only reach the logs.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub request_id: String,
    pub status: String,
}

impl AcceptedResponse {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            status: "accepted".to_string(),
        }
    }
}
