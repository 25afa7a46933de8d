//! Users Domain
//!
//! User management with separate write and read paths.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, display zone, audit events
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business rules, one transaction per call
//! └──┬───────┬──┘
//!    │       │
//!    ▼       ▼
//! Command   Query    ← Write path (versioned) / read path (read-only),
//!                      each on its own connection pool
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::locale::DisplayConfig;
//! use domain_users::{handlers, InMemoryUserStore, UserService};
//!
//! let store = InMemoryUserStore::new();
//! let service = UserService::new(store.command_repository(), store.query_repository());
//!
//! let router = handlers::router(service, DisplayConfig::default());
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{CreateUser, NewUser, Page, PageParams, UpdateUserName, User, UserResponse, UserView};
pub use postgres::{PgUserCommandRepository, PgUserQueryRepository};
pub use repository::{
    InMemoryUserStore, UserCommandRepository, UserCommandTx, UserQueryRepository, UserQuerySession,
};
pub use service::UserService;
