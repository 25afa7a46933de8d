use axum_helpers::server::{
    CleanupCoordinator, close_postgres, create_production_app, create_router, health_router,
};
use axum_helpers::JwtVerifier;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::connect_from_config_with_retry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    // Both pools connect concurrently; either failing aborts startup
    let command_future = async {
        connect_from_config_with_retry(config.command_db.clone(), Some(config.retry.clone()))
            .await
            .map_err(|e| eyre::eyre!("Command pool connection failed: {}", e))
    };

    let query_future = async {
        connect_from_config_with_retry(config.query_db.clone(), Some(config.retry.clone()))
            .await
            .map_err(|e| eyre::eyre!("Query pool connection failed: {}", e))
    };

    let (command_db, query_db) = tokio::try_join!(command_future, query_future)?;

    let jwt = JwtVerifier::new(&config.jwt)
        .map_err(|e| eyre::eyre!("Failed to initialize JWT verification: {}", e))?;

    let state = AppState {
        config,
        command_db,
        query_db,
        jwt: Arc::new(jwt),
    };

    let api_routes = api::routes(&state);

    let router =
        create_router::<openapi::ApiDoc>(api_routes, state.config.server.request_timeout()).await?;

    // - /health: liveness with app name/version
    // - /ready: pings both pools
    // - /info: app, environment and display defaults
    let app = router
        .merge(health_router(state.config.app.clone()))
        .merge(api::ops_router(state.clone()));

    info!("Starting users API");

    let server = state.config.server.clone();
    create_production_app(app, &server, Duration::from_secs(30), async move {
        info!("Shutting down: closing database pools");
        let mut cleanup = CleanupCoordinator::new();
        cleanup.add_task("command_db", close_postgres(state.command_db, "command"));
        cleanup.add_task("query_db", close_postgres(state.query_db, "query"));
        cleanup.run().await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API shutdown complete");
    Ok(())
}
