use actix_web::{web, HttpResponse};
use sv_shared::HealthResponse;

use crate::state::AppState;

/// Handler for GET /health
///
/// Answers 503 when the record store does not respond.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let version = env!("CARGO_PKG_VERSION");
    match state.verification_service.check_store().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse::healthy(version)),
        Err(_) => HttpResponse::ServiceUnavailable().json(HealthResponse::unhealthy(version)),
    }
}
