use actix_web::{web, HttpServer};
use anyhow::Context;
use std::time::Duration;
use tracing::info;

use sv_api::{create_app, logging::init_tracing, AppState};
use sv_infra::{build_store, create_mail_transport};
use sv_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let bind_address = config.server.bind_address();
    info!(
        environment = %config.environment,
        bind_address = %bind_address,
        store = ?config.store.backend,
        mail = ?config.mail.transport,
        "Starting SafeVoice verification server"
    );

    let handles = build_store(&config.store, &config.verification)
        .await
        .context("Failed to initialize verification store")?;
    let mailer =
        create_mail_transport(&config.mail).context("Failed to initialize mail transport")?;
    let state = web::Data::new(AppState::from_parts(handles, mailer, &config.verification));

    let workers = config.server.workers;
    let keep_alive = Duration::from_secs(config.server.keep_alive);
    let app_config = config.clone();

    let mut server = HttpServer::new(move || create_app(state.clone(), &app_config))
        .keep_alive(keep_alive);
    if workers > 0 {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}
