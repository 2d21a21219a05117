//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the SafeVoice
//! verification service. It provides concrete implementations of the
//! trait seams declared in `sv_core`.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Cache**: Redis client with retry logic
//! - **Store**: Verification record stores (in-memory and Redis), which also
//!   track failed attempts and lockouts
//! - **Mail**: Mail transports (SMTP via lettre, and a logging transport)

/// Cache module - Redis client and operations
pub mod cache;

/// Mail module - Outgoing mail transports
pub mod mail;

/// Store module - Verification record and attempt storage
pub mod store;

pub use cache::RedisClient;
pub use mail::{create_mail_transport, LogMailTransport, SmtpMailTransport};
pub use store::{build_store, MemoryStore, RedisStore, StoreHandles};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Mail transport error
    #[error("Mail error: {0}")]
    Mail(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
