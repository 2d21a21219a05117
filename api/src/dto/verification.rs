use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /send-verification`
///
/// Fields are optional so an absent value reaches the service and is
/// reported as a missing field rather than a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SendVerificationRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

impl SendVerificationRequest {
    /// Trim the email and treat a blank one as absent
    pub fn normalized(self) -> Self {
        Self {
            email: non_blank(self.email),
        }
    }
}

/// Body of `POST /verify-code`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    pub verified: bool,
    pub message: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_validation() {
        let valid = SendVerificationRequest {
            email: Some("survivor@example.com".to_string()),
        };
        assert!(valid.validate().is_ok());

        let invalid = SendVerificationRequest {
            email: Some("not-an-email".to_string()),
        };
        assert!(invalid.validate().is_err());

        // Absence is reported by the service, not the validator
        assert!(SendVerificationRequest::default().validate().is_ok());
    }

    #[test]
    fn test_normalized_trims_and_drops_blank() {
        let trimmed = SendVerificationRequest {
            email: Some("  survivor@example.com ".to_string()),
        }
        .normalized();
        assert_eq!(trimmed.email.as_deref(), Some("survivor@example.com"));

        let blank = SendVerificationRequest {
            email: Some("   ".to_string()),
        }
        .normalized();
        assert!(blank.email.is_none());
    }

    #[test]
    fn test_missing_fields_deserialize() {
        let request: VerifyCodeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.email.is_none());
        assert!(request.code.is_none());
    }
}
