//! Type definitions shared between the API layer and its tests
//!
//! - `response` - JSON response bodies and health checks

pub mod response;

pub use response::{ErrorResponse, HealthResponse, HealthStatus, MessageResponse};
