use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use cv_api::telemetry::init_tracing;
use cv_api::{create_app, AppState};
use cv_infra::build_registry;
use cv_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    tracing::info!(
        environment = %config.environment,
        event = "server_starting",
        "Starting CredVerify API server"
    );

    let registry = build_registry(&config)
        .await
        .context("Failed to build validator registry")?;

    let state = web::Data::new(
        AppState::new(Arc::new(registry)).with_max_payload_size(config.server.max_payload_size),
    );

    let bind_address = config.server.bind_address();
    tracing::info!(address = %bind_address, event = "server_binding", "Binding HTTP server");

    let mut server =
        HttpServer::new(move || create_app(state.clone()).wrap(TracingLogger::default()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server terminated abnormally")?;

    tracing::info!(event = "server_stopped", "CredVerify API server stopped");
    Ok(())
}
