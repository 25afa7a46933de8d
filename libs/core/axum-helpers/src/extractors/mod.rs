//! Custom extractors for Axum handlers.
//!
//! Both reject with an [`AppError`](crate::errors::AppError) so failures
//! share the standard error body.

pub mod id_path;
pub mod validated_json;

pub use id_path::IdPath;
pub use validated_json::ValidatedJson;
