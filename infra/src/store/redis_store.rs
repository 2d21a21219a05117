//! Redis verification store
//!
//! Key layout (under the configured prefix):
//! - `verification:record:{email}:{sha256(code)}` - JSON record, expires
//!   after the code lifetime plus the expired-record retention
//! - `verification:index:{email}` - set of record keys for an email
//! - `verification:failures:{email}` - failed validation counter
//! - `verification:lock:{email}` - present while the email is locked
//!
//! Codes never appear in plain text: a record is addressed by the hash of
//! its code and `take` is a single GETDEL, so concurrent validations of one
//! code cannot both succeed. `replace_all` runs as one Lua script, so
//! concurrent reissues leave a single record behind.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use sv_core::domain::entities::VerificationRecord;
use sv_core::services::verification::{AttemptTracker, VerificationStore};

use crate::cache::RedisClient;
use crate::InfrastructureError;

/// Record as persisted; the code is implied by the key
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: Uuid,
    email: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl StoredRecord {
    fn into_record(self, code: &str) -> VerificationRecord {
        VerificationRecord {
            id: self.id,
            email: self.email,
            code: code.to_string(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

impl From<&VerificationRecord> for StoredRecord {
    fn from(record: &VerificationRecord) -> Self {
        Self {
            id: record.id,
            email: record.email.clone(),
            issued_at: record.issued_at,
            expires_at: record.expires_at,
        }
    }
}

/// Redis-backed verification store and attempt tracker
#[derive(Clone)]
pub struct RedisStore {
    client: RedisClient,
    expired_retention: Duration,
}

impl RedisStore {
    pub fn new(client: RedisClient, expired_retention: Duration) -> Self {
        Self {
            client,
            expired_retention,
        }
    }

    fn record_key(&self, email: &str, code: &str) -> String {
        self.client
            .key(&format!("verification:record:{}:{}", email, hash_code(code)))
    }

    fn index_key(&self, email: &str) -> String {
        self.client.key(&format!("verification:index:{}", email))
    }

    fn failures_key(&self, email: &str) -> String {
        self.client.key(&format!("verification:failures:{}", email))
    }

    fn lock_key(&self, email: &str) -> String {
        self.client.key(&format!("verification:lock:{}", email))
    }

    async fn insert_record(&self, record: &VerificationRecord) -> Result<(), InfrastructureError> {
        let key = self.record_key(&record.email, &record.code);
        let value = serde_json::to_string(&StoredRecord::from(record))?;
        let ttl = expiry_seconds(record.expires_at - Utc::now() + self.expired_retention);

        self.client.set_with_expiry(&key, &value, ttl).await?;
        self.client
            .add_to_set(&self.index_key(&record.email), &key, ttl)
            .await
    }

    async fn replace_records(&self, record: &VerificationRecord) -> Result<u64, InfrastructureError> {
        let key = self.record_key(&record.email, &record.code);
        let value = serde_json::to_string(&StoredRecord::from(record))?;
        let ttl = expiry_seconds(record.expires_at - Utc::now() + self.expired_retention);

        self.client
            .replace_indexed(&self.index_key(&record.email), &key, &value, ttl)
            .await
    }

    async fn take_record(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<VerificationRecord>, InfrastructureError> {
        let key = self.record_key(email, code);
        let Some(value) = self.client.get_del(&key).await? else {
            return Ok(None);
        };

        // The record is already gone; a stale index entry is pruned later
        if let Err(e) = self
            .client
            .remove_from_set(&self.index_key(email), &[key])
            .await
        {
            warn!(error = %e, "Failed to drop taken record from index");
        }

        let stored: StoredRecord = serde_json::from_str(&value)?;
        Ok(Some(stored.into_record(code)))
    }

    async fn remove_records(&self, email: &str) -> Result<u64, InfrastructureError> {
        let index_key = self.index_key(email);
        let members = self.client.set_members(&index_key).await?;
        let removed = self.client.delete_many(&members).await?;
        self.client.delete(&index_key).await?;
        Ok(removed)
    }

    async fn latest_issued(&self, email: &str) -> Result<Option<DateTime<Utc>>, InfrastructureError> {
        let index_key = self.index_key(email);
        let members = self.client.set_members(&index_key).await?;
        let values = self.client.get_many(&members).await?;

        let mut latest = None;
        let mut stale = Vec::new();
        for (member, value) in members.into_iter().zip(values) {
            match value {
                Some(value) => {
                    let stored: StoredRecord = serde_json::from_str(&value)?;
                    latest = latest.max(Some(stored.issued_at));
                }
                None => stale.push(member),
            }
        }

        if !stale.is_empty() {
            debug!(stale = stale.len(), "Pruning expired entries from record index");
            self.client.remove_from_set(&index_key, &stale).await?;
        }
        Ok(latest)
    }
}

#[async_trait]
impl VerificationStore for RedisStore {
    async fn insert(&self, record: VerificationRecord) -> Result<(), String> {
        self.insert_record(&record).await.map_err(|e| e.to_string())
    }

    async fn take(&self, email: &str, code: &str) -> Result<Option<VerificationRecord>, String> {
        self.take_record(email, code).await.map_err(|e| e.to_string())
    }

    async fn remove_all(&self, email: &str) -> Result<u64, String> {
        self.remove_records(email).await.map_err(|e| e.to_string())
    }

    async fn replace_all(&self, record: VerificationRecord) -> Result<u64, String> {
        self.replace_records(&record).await.map_err(|e| e.to_string())
    }

    async fn latest_issued_at(&self, email: &str) -> Result<Option<DateTime<Utc>>, String> {
        self.latest_issued(email).await.map_err(|e| e.to_string())
    }

    async fn ping(&self) -> Result<(), String> {
        match self.client.health_check().await {
            Ok(true) => Ok(()),
            Ok(false) => Err("Unexpected PING reply from Redis".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[async_trait]
impl AttemptTracker for RedisStore {
    async fn record_failure(&self, email: &str, window: Duration) -> Result<u32, String> {
        let count = self
            .client
            .increment(&self.failures_key(email), Some(expiry_seconds(window)))
            .await
            .map_err(|e| e.to_string())?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn clear_failures(&self, email: &str) -> Result<(), String> {
        self.client
            .delete(&self.failures_key(email))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn lock(&self, email: &str, duration: Duration) -> Result<(), String> {
        let until = Utc::now() + duration;
        self.client
            .set_with_expiry(&self.lock_key(email), &until.to_rfc3339(), expiry_seconds(duration))
            .await
            .map_err(|e| e.to_string())
    }

    async fn lock_remaining(&self, email: &str) -> Result<Option<i64>, String> {
        match self.client.ttl(&self.lock_key(email)).await {
            Ok(ttl) => Ok(ttl.filter(|seconds| *seconds > 0)),
            Err(e) => {
                warn!(error = %e, "Failed to read verification lock");
                Err(e.to_string())
            }
        }
    }
}

/// Hex SHA-256 of a code
fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Whole seconds for a Redis expiry, rounded up and at least one
fn expiry_seconds(duration: Duration) -> u64 {
    let millis = duration.num_milliseconds().max(0) as u64;
    ((millis + 999) / 1000).max(1)
}
