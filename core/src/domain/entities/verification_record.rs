//! Verification record entity for email-based verification.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the verification code
pub const CODE_LENGTH: usize = 6;

/// Symbols a verification code is drawn from
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default lifetime of a verification code (2 minutes)
pub const DEFAULT_CODE_TTL_SECONDS: i64 = 120;

/// A code issued to an email address, valid until `expires_at`
///
/// Records are single use: a store hands a record out through an atomic
/// take, after which it no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Identifier of this issuance, used to correlate log events
    pub id: Uuid,

    /// Address the code was sent to
    pub email: String,

    /// The verification code
    pub code: String,

    /// Timestamp when the code was issued
    pub issued_at: DateTime<Utc>,

    /// Timestamp when the code expires
    pub expires_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// Creates a record issued now that lives for `ttl`
    pub fn new(email: impl Into<String>, code: impl Into<String>, ttl: Duration) -> Self {
        Self::issued_at(email, code, Utc::now(), ttl)
    }

    /// Creates a record with an explicit issuance time
    pub fn issued_at(
        email: impl Into<String>,
        code: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            code: code.into(),
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    /// Checks if the code has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Checks expiry against a given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the record is past its expiry plus the retention grace period
    ///
    /// Expired records are kept for a while so that a late submission can be
    /// told apart from a wrong one.
    pub fn is_evictable_at(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now > self.expires_at + retention
    }

    /// Checks that a code has the expected length and only uses the code alphabet
    pub fn is_well_formed_code(code: &str, length: usize) -> bool {
        code.len() == length && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
    }
}
