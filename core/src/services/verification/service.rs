//! Main verification service implementation

use chrono::Utc;
use std::sync::Arc;
use sv_shared::{mask_email, normalize_email};

use crate::domain::entities::VerificationRecord;
use crate::errors::{DomainError, DomainResult, VerificationError};

use super::code::generate_code;
use super::config::VerificationServiceConfig;
use super::email_template::{render_html_body, EMAIL_SUBJECT};
use super::traits::{AttemptTracker, MailTransport, VerificationStore};
use super::types::{IssuedCode, ValidationOutcome};

/// Verification service issuing and validating one-time email codes
///
/// The store, attempt tracker and mail transport are injected; the type
/// parameters accept trait objects so the backend can be picked at runtime.
pub struct VerificationService<S, A, M>
where
    S: VerificationStore + ?Sized,
    A: AttemptTracker + ?Sized,
    M: MailTransport + ?Sized,
{
    /// Storage for outstanding codes
    store: Arc<S>,
    /// Failure counters and locks
    attempts: Arc<A>,
    /// Mail transport for delivering codes
    mailer: Arc<M>,
    /// Service configuration
    config: VerificationServiceConfig,
}

impl<S, A, M> VerificationService<S, A, M>
where
    S: VerificationStore + ?Sized,
    A: AttemptTracker + ?Sized,
    M: MailTransport + ?Sized,
{
    /// Create a new verification service
    pub fn new(
        store: Arc<S>,
        attempts: Arc<A>,
        mailer: Arc<M>,
        config: VerificationServiceConfig,
    ) -> Self {
        Self {
            store,
            attempts,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &VerificationServiceConfig {
        &self.config
    }

    /// Issue a verification code to an email address
    ///
    /// This method:
    /// 1. Rejects a blank email
    /// 2. Enforces the resend cooldown when one is configured
    /// 3. Generates a new code and stores it, replacing earlier codes in the
    ///    same store operation when the reissue policy asks for it
    /// 4. Emails the code, rolling the record back if delivery fails
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedCode)` - once the mail transport accepted the message
    /// * `Err(DomainError)` - `MissingField`, `ResendTooSoon`, `DeliveryFailed`
    ///   or an internal store failure
    pub async fn issue_code(&self, email: &str) -> DomainResult<IssuedCode> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(VerificationError::missing_email().into());
        }
        let masked = mask_email(&email);

        self.check_resend_cooldown(&email, &masked).await?;

        let code = generate_code(self.config.code_length);
        let record = VerificationRecord::new(email.clone(), code, self.config.code_ttl());
        let (id, expires_at) = (record.id, record.expires_at);

        if self.config.invalidate_prior_on_reissue {
            let removed = self
                .store
                .replace_all(record.clone())
                .await
                .map_err(|e| store_error(&masked, "code_storage_failed", e))?;
            if removed > 0 {
                tracing::info!(
                    email = %masked,
                    removed = removed,
                    event = "previous_codes_invalidated",
                    "Invalidated previous verification codes"
                );
            }
        } else {
            self.store
                .insert(record.clone())
                .await
                .map_err(|e| store_error(&masked, "code_storage_failed", e))?;
        }

        tracing::info!(
            email = %masked,
            issuance_id = %id,
            expires_at = %expires_at,
            event = "code_issued",
            "Generated new verification code"
        );

        let body = render_html_body(&record.code, self.config.code_ttl_seconds);
        let message_id = match self.mailer.send(&email, EMAIL_SUBJECT, &body).await {
            Ok(message_id) => message_id,
            Err(reason) => {
                tracing::error!(
                    email = %masked,
                    issuance_id = %id,
                    error = %reason,
                    event = "code_delivery_failed",
                    "Failed to deliver verification code"
                );
                self.roll_back(&record, &masked).await;
                return Err(VerificationError::DeliveryFailed { reason }.into());
            }
        };

        tracing::info!(
            email = %masked,
            issuance_id = %id,
            message_id = %message_id,
            event = "code_sent",
            "Verification code sent"
        );

        Ok(IssuedCode {
            id,
            email,
            expires_at,
            message_id,
        })
    }

    /// Validate a submitted code for an email address
    ///
    /// A matching record is consumed whether or not it has expired, so a
    /// code validates successfully at most once. Every submission is charged
    /// against the failure budget before the lookup and the charge is cleared
    /// on success, so concurrent guesses never take more than
    /// `max_failed_attempts` lookups.
    ///
    /// # Returns
    ///
    /// * `Ok(ValidationOutcome)` - the code matched and was still live
    /// * `Err(DomainError)` - `MissingField`, `TooManyAttempts`, `InvalidCode`,
    ///   `CodeExpired` or an internal store failure
    pub async fn validate_code(&self, email: &str, code: &str) -> DomainResult<ValidationOutcome> {
        let email = normalize_email(email);
        if email.is_empty() || code.trim().is_empty() {
            return Err(VerificationError::missing_email_or_code().into());
        }
        let masked = mask_email(&email);

        self.ensure_not_locked(&email, &masked).await?;

        // Charge the attempt before the lookup so concurrent guesses cannot
        // outrun the failure budget
        let attempts = self
            .attempts
            .record_failure(&email, self.config.failure_window())
            .await
            .map_err(|e| store_error(&masked, "failure_tracking_failed", e))?;
        if attempts > self.config.max_failed_attempts {
            return Err(self.too_many_attempts(&masked, attempts));
        }
        // A lock placed while this attempt was being charged also applies
        self.ensure_not_locked(&email, &masked).await?;

        let taken = self
            .store
            .take(&email, code)
            .await
            .map_err(|e| store_error(&masked, "code_lookup_failed", e))?;

        match taken {
            None => self.handle_failed_attempt(&email, &masked, attempts).await,
            Some(record) if record.is_expired() => {
                tracing::info!(
                    email = %masked,
                    issuance_id = %record.id,
                    event = "code_expired",
                    "Expired verification code submitted"
                );
                Err(VerificationError::CodeExpired.into())
            }
            Some(record) => {
                self.attempts
                    .clear_failures(&email)
                    .await
                    .map_err(|e| store_error(&masked, "failure_reset_failed", e))?;

                tracing::info!(
                    email = %masked,
                    issuance_id = %record.id,
                    event = "code_verified",
                    "Verification code successfully verified"
                );

                Ok(ValidationOutcome {
                    email,
                    verified: true,
                    verified_at: Utc::now(),
                })
            }
        }
    }

    async fn ensure_not_locked(&self, email: &str, masked: &str) -> DomainResult<()> {
        let remaining = self
            .attempts
            .lock_remaining(email)
            .await
            .map_err(|e| store_error(masked, "lock_check_failed", e))?;

        match remaining {
            Some(retry_after_seconds) => {
                tracing::warn!(
                    email = %masked,
                    retry_after_seconds = retry_after_seconds,
                    event = "validation_while_locked",
                    "Verification attempted on a locked email"
                );
                Err(VerificationError::TooManyAttempts {
                    retry_after_seconds,
                }
                .into())
            }
            None => Ok(()),
        }
    }

    fn too_many_attempts(&self, masked: &str, attempts: u32) -> DomainError {
        tracing::warn!(
            email = %masked,
            attempts = attempts,
            max_failed_attempts = self.config.max_failed_attempts,
            event = "attempt_budget_exhausted",
            "Verification attempt refused, failure budget exhausted"
        );
        VerificationError::TooManyAttempts {
            retry_after_seconds: self.config.lockout_seconds,
        }
        .into()
    }

    async fn check_resend_cooldown(&self, email: &str, masked: &str) -> DomainResult<()> {
        if self.config.resend_cooldown_seconds <= 0 {
            return Ok(());
        }

        let latest = self
            .store
            .latest_issued_at(email)
            .await
            .map_err(|e| store_error(masked, "cooldown_check_failed", e))?;

        if let Some(issued_at) = latest {
            let remaining = issued_at + self.config.resend_cooldown() - Utc::now();
            if remaining > chrono::Duration::zero() {
                // Round up to whole seconds
                let retry_after_seconds = (remaining.num_milliseconds() + 999) / 1000;
                tracing::warn!(
                    email = %masked,
                    retry_after_seconds = retry_after_seconds,
                    event = "resend_too_soon",
                    "Verification code requested during cooldown"
                );
                return Err(VerificationError::ResendTooSoon {
                    retry_after_seconds,
                }
                .into());
            }
        }

        Ok(())
    }

    async fn handle_failed_attempt(
        &self,
        email: &str,
        masked: &str,
        failures: u32,
    ) -> DomainResult<ValidationOutcome> {
        if failures < self.config.max_failed_attempts {
            tracing::warn!(
                email = %masked,
                failures = failures,
                max_failed_attempts = self.config.max_failed_attempts,
                event = "code_verification_failed",
                "Verification code did not match"
            );
            return Err(VerificationError::InvalidCode.into());
        }

        self.attempts
            .lock(email, self.config.lockout())
            .await
            .map_err(|e| store_error(masked, "lock_failed", e))?;
        self.store
            .remove_all(email)
            .await
            .map_err(|e| store_error(masked, "invalidate_previous_codes", e))?;
        self.attempts
            .clear_failures(email)
            .await
            .map_err(|e| store_error(masked, "failure_reset_failed", e))?;

        tracing::error!(
            email = %masked,
            failures = failures,
            lockout_seconds = self.config.lockout_seconds,
            event = "max_attempts_exceeded",
            "Maximum verification attempts exceeded, email locked"
        );

        Err(VerificationError::TooManyAttempts {
            retry_after_seconds: self.config.lockout_seconds,
        }
        .into())
    }

    /// Check that the record store is reachable
    pub async fn check_store(&self) -> DomainResult<()> {
        self.store.ping().await.map_err(|e| {
            tracing::error!(
                error = %e,
                event = "store_health_check_failed",
                "Verification store is unreachable"
            );
            DomainError::Internal {
                message: format!("Verification store unreachable: {}", e),
            }
        })
    }

    /// Remove the record of an issuance whose email never went out
    async fn roll_back(&self, record: &VerificationRecord, masked: &str) {
        if let Err(e) = self.store.take(&record.email, &record.code).await {
            tracing::error!(
                email = %masked,
                issuance_id = %record.id,
                error = %e,
                event = "code_rollback_failed",
                "Failed to remove undelivered verification code"
            );
        }
    }
}

fn store_error(masked: &str, event: &'static str, error: String) -> DomainError {
    tracing::error!(
        email = %masked,
        error = %error,
        event = event,
        "Verification store operation failed"
    );
    DomainError::Internal {
        message: format!("Verification store failure: {}", error),
    }
}
