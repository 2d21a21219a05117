//! # SafeVoice Core
//!
//! Core business logic and domain layer for the SafeVoice backend.
//! This crate contains the verification record entity, the email
//! verification service with its storage and mail trait seams, and the
//! error types the HTTP layer translates into responses.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
