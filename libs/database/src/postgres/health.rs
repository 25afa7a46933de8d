use sea_orm::DatabaseConnection;
use std::time::Instant;
use tracing::debug;

use crate::common::{DatabaseError, DatabaseResult};

/// Ping the pool, acquiring a connection in the process.
///
/// Used by readiness probes; fails when the pool cannot hand out a live
/// connection within its acquire timeout.
pub async fn check_health(db: &DatabaseConnection) -> DatabaseResult<()> {
    let start = Instant::now();

    db.ping()
        .await
        .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;

    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "PostgreSQL ping ok");
    Ok(())
}
