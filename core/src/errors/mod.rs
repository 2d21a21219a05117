//! Domain-specific error types and error handling.

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// Failures of the email verification flow that callers act on
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// A required input was absent or blank
    #[error("{field} required")]
    MissingField { field: String },

    /// No outstanding code matches the submitted email and code
    #[error("Invalid code")]
    InvalidCode,

    /// The code matched but its lifetime has elapsed
    #[error("Code expired")]
    CodeExpired,

    /// The email is locked after repeated failed validations
    #[error("Too many failed attempts. Try again in {retry_after_seconds} seconds")]
    TooManyAttempts { retry_after_seconds: i64 },

    /// A code was issued to this email too recently
    #[error("Please wait {retry_after_seconds} seconds before requesting a new code")]
    ResendTooSoon { retry_after_seconds: i64 },

    /// The mail transport rejected the message
    #[error("Failed to send verification code")]
    DeliveryFailed { reason: String },
}

impl VerificationError {
    /// Missing email on issuance
    pub fn missing_email() -> Self {
        Self::MissingField {
            field: "Email".to_string(),
        }
    }

    /// Missing email or code on validation
    pub fn missing_email_or_code() -> Self {
        Self::MissingField {
            field: "Email and code".to_string(),
        }
    }

    /// Stable machine-readable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::InvalidCode => "invalid_code",
            Self::CodeExpired => "code_expired",
            Self::TooManyAttempts { .. } => "too_many_attempts",
            Self::ResendTooSoon { .. } => "resend_too_soon",
            Self::DeliveryFailed { .. } => "delivery_failed",
        }
    }

    /// Seconds the caller should wait before retrying, if the error is temporary
    pub fn retry_after_seconds(&self) -> Option<i64> {
        match self {
            Self::TooManyAttempts {
                retry_after_seconds,
            }
            | Self::ResendTooSoon {
                retry_after_seconds,
            } => Some(*retry_after_seconds),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_messages() {
        assert_eq!(VerificationError::missing_email().to_string(), "Email required");
        assert_eq!(
            VerificationError::missing_email_or_code().to_string(),
            "Email and code required"
        );
    }

    #[test]
    fn test_invalid_and_expired_are_distinct() {
        assert_eq!(VerificationError::InvalidCode.to_string(), "Invalid code");
        assert_eq!(VerificationError::CodeExpired.to_string(), "Code expired");
        assert_ne!(
            VerificationError::InvalidCode.error_code(),
            VerificationError::CodeExpired.error_code()
        );
    }

    #[test]
    fn test_delivery_failure_hides_reason() {
        let err = VerificationError::DeliveryFailed {
            reason: "SMTP 535 authentication failed".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to send verification code");
        assert_eq!(err.retry_after_seconds(), None);
    }

    #[test]
    fn test_retry_after() {
        let err = VerificationError::TooManyAttempts {
            retry_after_seconds: 900,
        };
        assert_eq!(err.retry_after_seconds(), Some(900));
        assert_eq!(err.error_code(), "too_many_attempts");
    }

    #[test]
    fn test_domain_error_is_transparent_over_verification_error() {
        let err: DomainError = VerificationError::CodeExpired.into();
        assert_eq!(err.to_string(), "Code expired");
    }
}
