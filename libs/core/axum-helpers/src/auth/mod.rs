//! Bearer-token authentication for resource servers.
//!
//! Tokens are issued elsewhere; this module only verifies them:
//! - JWT signature, expiry and optional issuer/audience checks
//! - Mapping of a groups claim to prefixed authorities
//! - Middleware that rejects unauthenticated requests with 401
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::auth::{JwtConfig, JwtVerifier, jwt_auth_middleware};
//! use core_config::FromEnv;
//!
//! let verifier = Arc::new(JwtVerifier::new(&JwtConfig::from_env()?)?);
//!
//! let protected = Router::new()
//!     .route("/users", get(handler))
//!     .layer(axum::middleware::from_fn_with_state(verifier, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::{JwtConfig, JwtKey};
pub use jwt::{AuthError, JwtClaims, JwtVerifier, Principal};
pub use middleware::jwt_auth_middleware;
