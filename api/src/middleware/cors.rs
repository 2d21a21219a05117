//! CORS middleware configuration for cross-origin requests.
//!
//! The web front end is served from a different origin than the API, so
//! allowed origins, methods and headers come from `CorsConfig`. A `*` entry
//! in `allowed_origins` allows any origin.

use actix_cors::Cors;
use actix_web::http::{header::HeaderName, Method};

use sv_shared::CorsConfig;

/// Creates a CORS middleware instance from configuration.
///
/// Entries that are not valid methods or header names are skipped with a
/// warning.
pub fn create_cors(config: &CorsConfig) -> Cors {
    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|method| match method.parse::<Method>() {
            Ok(method) => Some(method),
            Err(_) => {
                tracing::warn!(method = %method, "Ignoring invalid CORS method");
                None
            }
        })
        .collect();

    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|name| match HeaderName::try_from(name.as_str()) {
            Ok(name) => Some(name),
            Err(_) => {
                tracing::warn!(header = %name, "Ignoring invalid CORS header");
                None
            }
        })
        .collect();

    let mut cors = Cors::default()
        .allowed_methods(methods)
        .allowed_headers(headers)
        .max_age(config.max_age);

    if config.allows_any_origin() {
        tracing::warn!("CORS configured to allow any origin");
        return cors.allow_any_origin();
    }

    for origin in config.allowed_origins.iter().map(|o| o.trim()) {
        if !origin.is_empty() {
            tracing::debug!(origin = %origin, "Adding allowed origin");
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}
