use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use super::PostgresConfig;
use crate::common::{RetryConfig, retry_with_backoff};

/// Connect with explicit connection options
pub async fn connect_with_options(options: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    info!("Connected to PostgreSQL");
    Ok(db)
}

/// Connect using a PostgresConfig
///
/// ```ignore
/// use database::postgres::{PostgresConfig, connect_from_config};
///
/// let db = connect_from_config(PostgresConfig::with_pool_size(url, 5, 1)).await?;
/// ```
pub async fn connect_from_config(config: PostgresConfig) -> Result<DatabaseConnection, DbErr> {
    info!(
        url = %config.redacted_url(),
        max_connections = config.max_connections,
        "Opening PostgreSQL pool"
    );
    connect_with_options(config.into_connect_options()).await
}

/// Connect from config, retrying with exponential backoff
///
/// Intended for startup, where the database may come up after the service.
///
/// ```ignore
/// use database::postgres::{PostgresConfig, connect_from_config_with_retry};
/// use database::common::RetryConfig;
///
/// let retry = RetryConfig::new().with_max_retries(5);
/// let db = connect_from_config_with_retry(config, Some(retry)).await?;
/// ```
pub async fn connect_from_config_with_retry(
    config: PostgresConfig,
    retry_config: Option<RetryConfig>,
) -> Result<DatabaseConnection, DbErr> {
    info!(
        url = %config.redacted_url(),
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Opening PostgreSQL pool"
    );
    let options = config.into_connect_options();

    retry_with_backoff(
        || connect_with_options(options.clone()),
        retry_config.unwrap_or_default(),
    )
    .await
}
