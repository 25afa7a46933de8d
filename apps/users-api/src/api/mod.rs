use axum::Router;
use axum::routing::get;

pub mod health;
pub mod public;
pub mod users;

/// API routes without the `/api` prefix; `create_router` adds it.
///
/// Everything under `/users` requires a bearer token. `/public` does not.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new()
        .nest("/users", users::router(state))
        .nest("/public", public::router(state))
}

/// `/ready` and `/info`, merged at the root next to `/health`
pub fn ops_router(state: crate::state::AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .route("/info", get(health::info_handler))
        .with_state(state)
}
