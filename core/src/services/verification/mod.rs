//! Verification service module for email-based verification
//!
//! This module provides the verification code workflow:
//! - Code generation from the OS random number generator
//! - Code storage and email delivery with rollback on delivery failure
//! - Single-use validation with expiry and per-email lockout
//! - Trait seams for the record store, attempt tracking and mail transport

mod code;
mod config;
mod email_template;
mod service;
mod traits;
mod types;


pub use code::{codes_match, generate_code};
pub use config::VerificationServiceConfig;
pub use email_template::{render_html_body, EMAIL_SUBJECT};
pub use service::VerificationService;
pub use traits::{AttemptTracker, MailTransport, VerificationStore};
pub use types::{IssuedCode, ValidationOutcome};
