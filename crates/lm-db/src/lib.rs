//! lm-db - Database abstraction layer for libsql-migrate
//!
//! This crate provides the `Database` trait and the libSQL backend used
//! to reach remote (and local) libSQL databases.

pub mod backend;
pub mod error;
pub mod traits;

pub use backend::{redacted_connection_string, LibsqlBackend};
pub use error::{DbError, DbResult};
pub use traits::{Database, Value};
