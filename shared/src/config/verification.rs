//! Verification code policy configuration

use serde::{Deserialize, Serialize};

/// Lifetime, reissue and lockout settings for email verification codes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Number of characters in a code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds a code stays valid after issuance
    #[serde(default = "default_code_ttl")]
    pub code_ttl_seconds: i64,

    /// Remove outstanding codes for an email when a new one is issued
    #[serde(default = "default_invalidate_prior")]
    pub invalidate_prior_on_reissue: bool,

    /// Minimum seconds between two issuances for one email (0 disables)
    #[serde(default)]
    pub resend_cooldown_seconds: i64,

    /// Failed validations that lock an email
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,

    /// Seconds an email stays locked
    #[serde(default = "default_lockout")]
    pub lockout_seconds: i64,

    /// Seconds an expired record is kept so it can be reported as expired
    #[serde(default = "default_expired_retention")]
    pub expired_retention_seconds: i64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            code_ttl_seconds: default_code_ttl(),
            invalidate_prior_on_reissue: default_invalidate_prior(),
            resend_cooldown_seconds: 0,
            max_failed_attempts: default_max_failed_attempts(),
            lockout_seconds: default_lockout(),
            expired_retention_seconds: default_expired_retention(),
        }
    }
}

impl VerificationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(4..=12).contains(&self.code_length) {
            return Err(format!(
                "verification.code_length must be between 4 and 12, got {}",
                self.code_length
            ));
        }
        if self.code_ttl_seconds < 0 {
            return Err("verification.code_ttl_seconds must not be negative".to_string());
        }
        if self.resend_cooldown_seconds < 0 {
            return Err("verification.resend_cooldown_seconds must not be negative".to_string());
        }
        if self.max_failed_attempts == 0 {
            return Err("verification.max_failed_attempts must be at least 1".to_string());
        }
        if self.lockout_seconds <= 0 {
            return Err("verification.lockout_seconds must be greater than zero".to_string());
        }
        if self.expired_retention_seconds < 0 {
            return Err("verification.expired_retention_seconds must not be negative".to_string());
        }
        Ok(())
    }
}

fn default_code_length() -> usize {
    6
}

fn default_code_ttl() -> i64 {
    120
}

fn default_invalidate_prior() -> bool {
    true
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_lockout() -> i64 {
    900
}

fn default_expired_retention() -> i64 {
    600
}
