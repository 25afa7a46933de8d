//! Readiness and info handlers backed by the real pools.

use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use database::postgres::check_health;
use serde_json::json;

/// Readiness: pings the command and query pools concurrently.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![
        (
            "command_db",
            Box::pin(async {
                check_health(&state.command_db)
                    .await
                    .map_err(|e| format!("Command pool ping failed: {}", e))
            }),
        ),
        (
            "query_db",
            Box::pin(async {
                check_health(&state.query_db)
                    .await
                    .map_err(|e| format!("Query pool ping failed: {}", e))
            }),
        ),
    ];

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}

/// Build and display metadata
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = &state.config;
    Json(json!({
        "app": {
            "name": config.app.name,
            "version": config.app.version,
        },
        "environment": config.environment.as_str(),
        "display": {
            "timeZone": config.display.time_zone.name(),
            "locale": config.display.locale,
        },
        "requestTimeoutMs": config.server.request_timeout_ms,
    }))
}
