pub mod error;
pub mod models;
pub mod repository;

pub use error::{Result, StorageError};
pub use repository::{InMemoryStore, PgStore, ResultStore};
