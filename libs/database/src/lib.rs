//! Database library providing PostgreSQL connectors and utilities
//!
//! Connection pools are plain values: an application that separates its write
//! and read paths builds one [`postgres::PostgresConfig`] per path and connects
//! each independently. Whether both point at the same server or at a
//! primary/replica pair is purely a configuration decision.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL support with SeaORM
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Examples
//!
//! ```ignore
//! use database::postgres::{PostgresConfig, connect_from_config_with_retry};
//!
//! let command = PostgresConfig::from_env_with_prefix("COMMAND", &PostgresConfig::with_pool_size("", 5, 1))?;
//! let query = PostgresConfig::from_env_with_prefix("QUERY", &command.with_pool(10, 2))?;
//!
//! let (command_db, query_db) = tokio::try_join!(
//!     connect_from_config_with_retry(command, None),
//!     connect_from_config_with_retry(query, None),
//! )?;
//! ```

// Always available modules
pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-exports for convenience
pub use common::{DatabaseError, DatabaseResult};
