//! Traits for record storage, attempt tracking and mail delivery

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::VerificationRecord;

/// Keyed storage of outstanding verification records
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Store a record; a record with the same email and code is replaced
    async fn insert(&self, record: VerificationRecord) -> Result<(), String>;
    /// Atomically find and remove the record matching both email and code
    async fn take(&self, email: &str, code: &str) -> Result<Option<VerificationRecord>, String>;
    /// Remove every record for an email, returning how many were removed
    async fn remove_all(&self, email: &str) -> Result<u64, String>;
    /// Remove every record for the record's email and store the record, as one step
    ///
    /// Returns how many records were removed. Concurrent calls for one email
    /// leave exactly one record behind.
    async fn replace_all(&self, record: VerificationRecord) -> Result<u64, String>;
    /// Issuance time of the newest record held for an email
    async fn latest_issued_at(&self, email: &str) -> Result<Option<DateTime<Utc>>, String>;
    /// Check that the backing storage is reachable
    async fn ping(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Per-email failed validation counters and lockouts
#[async_trait]
pub trait AttemptTracker: Send + Sync {
    /// Charge a validation attempt, returning the running count
    ///
    /// The counter lives for `window` after the first attempt and is reset
    /// by `clear_failures` when a code validates.
    async fn record_failure(&self, email: &str, window: Duration) -> Result<u32, String>;
    /// Reset the failure counter
    async fn clear_failures(&self, email: &str) -> Result<(), String>;
    /// Lock the email for `duration`
    async fn lock(&self, email: &str, duration: Duration) -> Result<(), String>;
    /// Seconds left on the lock, `None` when the email is not locked
    async fn lock_remaining(&self, email: &str) -> Result<Option<i64>, String>;
}

/// Outgoing mail delivery
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send an HTML message, returning the transport's message id
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, String>;
}
