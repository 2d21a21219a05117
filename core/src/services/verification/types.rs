//! Types for verification service results

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of issuing a verification code
///
/// The code itself only travels by email.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    /// Issuance identifier
    pub id: Uuid,
    /// Address the code was sent to
    pub email: String,
    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Message id reported by the mail transport
    pub message_id: String,
}

/// Result of a successful validation
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub email: String,
    pub verified: bool,
    pub verified_at: DateTime<Utc>,
}
