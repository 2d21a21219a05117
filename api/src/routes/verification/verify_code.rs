use actix_web::{web, HttpResponse};

use crate::dto::{VerifyCodeRequest, VerifyCodeResponse};
use crate::handlers::ApiError;
use crate::state::AppState;

/// Handler for POST /verify-code
///
/// # Request Body
///
/// ```json
/// { "email": "survivor@example.com", "code": "AB12CD" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// { "verified": true, "message": "Email verified successfully" }
/// ```
///
/// ## Errors
/// - 400 `missing_field` / `invalid_code` / `code_expired`
/// - 429 `too_many_attempts` with `Retry-After`
pub async fn verify_code(
    state: web::Data<AppState>,
    request: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    let email = request.email.unwrap_or_default();
    let code = request.code.unwrap_or_default();

    let outcome = state
        .verification_service
        .validate_code(&email, &code)
        .await?;

    Ok(HttpResponse::Ok().json(VerifyCodeResponse {
        verified: outcome.verified,
        message: "Email verified successfully".to_string(),
    }))
}
