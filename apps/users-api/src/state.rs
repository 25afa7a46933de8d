//! Shared application state.

use axum_helpers::JwtVerifier;
use database::postgres::DatabaseConnection;
use std::sync::Arc;

/// Cloned into every router; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Pool for the write path
    pub command_db: DatabaseConnection,
    /// Pool for the read path; may point at a replica
    pub query_db: DatabaseConnection,
    pub jwt: Arc<JwtVerifier>,
}
