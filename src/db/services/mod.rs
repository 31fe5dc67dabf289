//! The `services` module holds the SQL for the Postgres backend.
//!
//! Each sub-module covers one table. Every task and category query filters
//! on `user_id`, so rows of other users are indistinguishable from missing
//! rows. All public functions are re-exported here so callers can use the
//! `crate::db::services::` path.

pub mod category_service;
pub mod task_service;
pub mod user_service;

pub use category_service::*;
pub use task_service::*;
pub use user_service::*;
