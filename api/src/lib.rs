//! HTTP API for the SafeVoice email verification service

pub mod app;
pub mod dto;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use state::AppState;
