//! Data Transfer Objects for API requests and responses.

mod error;
mod health;
mod notification_request;

pub use error::ErrorResponse;
pub use health::{HealthResponse, HealthStatus};
pub use notification_request::AcceptedResponse;
