//! Conversion of domain failures into HTTP responses
//!
//! Every failure leaves the API as an `ErrorResponse` body:
//!
//! | Error | Status | `error` |
//! |-------|--------|---------|
//! | missing field | 400 | `missing_field` |
//! | malformed email | 400 | `invalid_email` |
//! | wrong code | 400 | `invalid_code` |
//! | expired code | 400 | `code_expired` |
//! | locked email | 429 | `too_many_attempts` |
//! | cooldown | 429 | `resend_too_soon` |
//! | delivery failure | 500 | `delivery_failed` |
//! | store failure | 500 | `internal_error` |

use actix_web::{
    error::{InternalError, JsonPayloadError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse, ResponseError,
};
use std::fmt;

use sv_core::errors::{DomainError, VerificationError};
use sv_shared::ErrorResponse;

/// Error returned by route handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
    retry_after_seconds: Option<i64>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(error, message),
            retry_after_seconds: None,
        }
    }

    /// The submitted email is not a syntactically valid address
    pub fn invalid_email() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_email", "Invalid email address")
    }

    fn with_retry_after(mut self, seconds: i64) -> Self {
        self.body = self.body.add_detail("retry_after_seconds", seconds);
        self.retry_after_seconds = Some(seconds);
        self
    }

    pub fn body(&self) -> &ErrorResponse {
        &self.body
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.body.error, self.body.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status);
        if let Some(seconds) = self.retry_after_seconds {
            response.insert_header((header::RETRY_AFTER, seconds.to_string()));
        }
        response.json(&self.body)
    }
}

impl From<VerificationError> for ApiError {
    fn from(error: VerificationError) -> Self {
        let status = match &error {
            VerificationError::MissingField { .. }
            | VerificationError::InvalidCode
            | VerificationError::CodeExpired => StatusCode::BAD_REQUEST,
            VerificationError::TooManyAttempts { .. } | VerificationError::ResendTooSoon { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            VerificationError::DeliveryFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let api_error = Self::new(status, error.error_code(), error.to_string());
        match error.retry_after_seconds() {
            Some(seconds) => api_error.with_retry_after(seconds),
            None => api_error,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Verification(error) => error.into(),
            DomainError::Internal { message } => {
                tracing::error!(error = %message, "Internal error while handling request");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred",
                )
            }
        }
    }
}

/// Error handler for JSON bodies that cannot be read or parsed
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Content-Type must be application/json".to_string(),
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            "Request body is too large".to_string()
        }
        JsonPayloadError::Deserialize(e) => format!("Malformed JSON body: {}", e),
        _ => "Invalid request body".to_string(),
    };

    tracing::warn!(
        path = %req.path(),
        error = %err,
        event = "invalid_request_body",
        "Rejected request body"
    );

    let response = HttpResponse::BadRequest().json(ErrorResponse::new("invalid_request", message));
    InternalError::from_response(err, response).into()
}

/// Default 404 handler
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        "not_found",
        "The requested resource was not found",
    ))
}
