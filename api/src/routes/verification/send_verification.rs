use actix_web::{web, HttpResponse};
use validator::Validate;

use sv_shared::{mask_email, MessageResponse};

use crate::dto::SendVerificationRequest;
use crate::handlers::ApiError;
use crate::state::AppState;

/// Handler for POST /send-verification
///
/// Sends a verification code to the specified email address.
///
/// # Request Body
///
/// ```json
/// { "email": "survivor@example.com" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// { "message": "Verification code sent to your email." }
/// ```
///
/// ## Errors
/// - 400 `missing_field` / `invalid_email`
/// - 429 `resend_too_soon` with `Retry-After`
/// - 500 `delivery_failed`
pub async fn send_verification(
    state: web::Data<AppState>,
    request: web::Json<SendVerificationRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner().normalized();

    if request.validate().is_err() {
        tracing::warn!(
            email = %mask_email(request.email.as_deref().unwrap_or_default()),
            event = "invalid_email_rejected",
            "Rejected malformed email address"
        );
        return Err(ApiError::invalid_email());
    }

    let email = request.email.unwrap_or_default();
    state.verification_service.issue_code(&email).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Verification code sent to your email.")))
}
