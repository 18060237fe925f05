//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// A single column value read back from a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Integer view of the value, accepting SQLite's loose typing for text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Database abstraction trait for libsql-migrate
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Liveness check; fails fast on unreachable hosts or bad credentials
    async fn ping(&self) -> DbResult<()>;

    /// Execute a single statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<u64>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute multiple SQL statements between BEGIN and COMMIT,
    /// rolling back if any statement fails
    async fn execute_in_transaction(&self, sql: &str) -> DbResult<()>;

    /// Return the first row of a query, or None if it produced no rows
    async fn query_row(&self, sql: &str) -> DbResult<Option<Vec<Value>>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Release the underlying session. Closing twice is a no-op.
    async fn close(&self) -> DbResult<()>;
}
