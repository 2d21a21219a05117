//! Shared utilities and common types for the SafeVoice server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and the layered configuration loader
//! - API response structures
//! - Utility functions (email masking)

pub mod config;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, CorsConfig, Environment, LogFormat, LoggingConfig,
    MailConfig, MailTransportKind, ServerConfig, StoreBackend, StoreConfig, VerificationConfig,
};
pub use types::{ErrorResponse, HealthResponse, HealthStatus, MessageResponse};
pub use utils::{mask_email, normalize_email};
