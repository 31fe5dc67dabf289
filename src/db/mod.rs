pub mod error;
pub mod memory_store;
pub mod models;
pub mod pg_store;
pub mod services;
pub mod store;
pub mod update;

pub use error::StoreError;
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use store::{Store, StoreResult};
