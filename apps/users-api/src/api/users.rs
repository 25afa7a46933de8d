use axum::{Router, middleware};
use axum_helpers::jwt_auth_middleware;
use domain_users::{PgUserCommandRepository, PgUserQueryRepository, UserService, handlers};

use crate::state::AppState;

/// Users API behind JWT authentication.
///
/// Writes use the command pool, reads use the query pool.
pub fn router(state: &AppState) -> Router {
    let service = UserService::new(
        PgUserCommandRepository::new(state.command_db.clone()),
        PgUserQueryRepository::new(state.query_db.clone()),
    );

    handlers::router(service, state.config.display.clone()).layer(middleware::from_fn_with_state(
        state.jwt.clone(),
        jwt_auth_middleware,
    ))
}
