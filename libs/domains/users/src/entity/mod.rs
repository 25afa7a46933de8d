//! SeaORM entities for the `users` table.
//!
//! The write path and the read path map the same table through separate
//! entities; only the write entity knows about `version`.

pub mod command;
pub mod query;
