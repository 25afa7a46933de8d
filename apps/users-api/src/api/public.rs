//! Unauthenticated endpoints.

use axum::{Json, Router, extract::State, routing::get};
use core_config::AppInfo;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicStatus {
    #[schema(example = "users_api")]
    pub name: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    #[schema(example = "UP")]
    pub status: &'static str,
}

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .with_state(state.config.app.clone())
}

/// Service status, no token required
#[utoipa::path(
    get,
    path = "/public/status",
    tag = "public",
    responses(
        (status = 200, description = "Service is up", body = PublicStatus)
    ),
    security(())
)]
pub async fn status(State(app): State<AppInfo>) -> Json<PublicStatus> {
    Json(PublicStatus {
        name: app.name,
        version: app.version,
        status: "UP",
    })
}
