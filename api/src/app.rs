//! Application factory
//!
//! Builds the Actix-web application: state, JSON limits, middleware and
//! routes. Used by the binary and by the integration tests.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use tracing_actix_web::TracingLogger;

use sv_shared::AppConfig;

use crate::handlers::{json_error_handler, not_found};
use crate::middleware::create_cors;
use crate::routes::{health::health_check, verification};
use crate::state::AppState;

/// Create and configure the application with all dependencies
pub fn create_app(
    state: web::Data<AppState>,
    config: &AppConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let json_config = web::JsonConfig::default()
        .limit(config.server.max_payload_size)
        .error_handler(json_error_handler);

    App::new()
        .app_data(state)
        .app_data(json_config)
        // Registration order is inverse to execution: logging runs outermost
        .wrap(create_cors(&config.cors))
        .wrap(TracingLogger::default())
        .configure(configure_routes)
        .default_service(web::route().to(not_found))
}

/// Register the API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route(
            "/send-verification",
            web::post().to(verification::send_verification),
        )
        .route("/verify-code", web::post().to(verification::verify_code));
}
