//! Configuration for the verification service

use chrono::Duration;
use sv_shared::VerificationConfig;

use crate::domain::entities::verification_record::{CODE_LENGTH, DEFAULT_CODE_TTL_SECONDS};

/// Shortest window a failure counter is kept for
pub const MIN_FAILURE_WINDOW_SECONDS: i64 = 60;

/// Configuration for the verification service
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// Number of characters in a code
    pub code_length: usize,
    /// Seconds before a verification code expires
    pub code_ttl_seconds: i64,
    /// Remove outstanding codes for an email when issuing a new one
    pub invalidate_prior_on_reissue: bool,
    /// Minimum seconds between issuances for one email (0 disables)
    pub resend_cooldown_seconds: i64,
    /// Failed validations before the email is locked
    pub max_failed_attempts: u32,
    /// Seconds an email stays locked
    pub lockout_seconds: i64,
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self {
            code_length: CODE_LENGTH,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            invalidate_prior_on_reissue: true,
            resend_cooldown_seconds: 0,
            max_failed_attempts: 5,
            lockout_seconds: 900,
        }
    }
}

impl From<&VerificationConfig> for VerificationServiceConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            code_length: config.code_length,
            code_ttl_seconds: config.code_ttl_seconds,
            invalidate_prior_on_reissue: config.invalidate_prior_on_reissue,
            resend_cooldown_seconds: config.resend_cooldown_seconds,
            max_failed_attempts: config.max_failed_attempts,
            lockout_seconds: config.lockout_seconds,
        }
    }
}

impl VerificationServiceConfig {
    pub fn code_ttl(&self) -> Duration {
        Duration::seconds(self.code_ttl_seconds)
    }

    pub fn resend_cooldown(&self) -> Duration {
        Duration::seconds(self.resend_cooldown_seconds)
    }

    pub fn lockout(&self) -> Duration {
        Duration::seconds(self.lockout_seconds)
    }

    /// Failure counters follow the code lifetime, with a floor
    pub fn failure_window(&self) -> Duration {
        Duration::seconds(self.code_ttl_seconds.max(MIN_FAILURE_WINDOW_SECONDS))
    }
}
