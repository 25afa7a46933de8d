use axum_helpers::JwtConfig;
use core_config::{AppInfo, FromEnv, app_info, locale::DisplayConfig, server::ServerConfig};
use database::common::RetryConfig;
use database::postgres::PostgresConfig;

pub use core_config::Environment;

/// Command pool defaults: few connections, writes are short
const COMMAND_POOL: (u32, u32) = (5, 1);
/// Query pool defaults: reads take the bulk of the traffic
const QUERY_POOL: (u32, u32) = (10, 2);

/// Application configuration
///
/// The command and query pools are configured independently. Leaving
/// `QUERY_DATABASE_URL` unset points both at the same database.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub command_db: PostgresConfig,
    pub query_db: PostgresConfig,
    pub retry: RetryConfig,
    pub jwt: JwtConfig,
    pub display: DisplayConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();

        let (max, min) = COMMAND_POOL;
        let command_db = PostgresConfig::from_env_with_prefix(
            "COMMAND",
            &PostgresConfig::with_pool_size("", max, min),
        )?;

        let (max, min) = QUERY_POOL;
        let query_db = PostgresConfig::from_env_with_prefix("QUERY", &command_db.with_pool(max, min))?;

        Ok(Self {
            app: app_info!(),
            command_db,
            query_db,
            retry: RetryConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            display: DisplayConfig::from_env()?,
            server: ServerConfig::from_env()?,
            environment,
        })
    }
}
