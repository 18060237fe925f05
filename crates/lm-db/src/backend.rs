//! libSQL database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Value};
use async_trait::async_trait;
use libsql::{Builder, Connection};
use std::sync::Mutex;

/// URL schemes that address a remote libSQL server
const REMOTE_SCHEMES: &[&str] = &["libsql://", "https://", "http://"];

/// WebSocket schemes and the HTTP scheme the driver speaks in their place
const WEBSOCKET_SCHEMES: &[(&str, &str)] = &[("wss://", "https://"), ("ws://", "http://")];

/// Where a connection URL points
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    Remote(String),
    Local(&'a str),
}

fn classify(url: &str) -> DbResult<Target<'_>> {
    if url.is_empty() {
        return Err(DbError::ConnectionError("empty database URL".to_string()));
    }
    if url == ":memory:" {
        return Ok(Target::Local(url));
    }
    if let Some(path) = url.strip_prefix("file:") {
        if path.is_empty() {
            return Err(DbError::ConnectionError(format!(
                "missing path in database URL '{url}'"
            )));
        }
        return Ok(Target::Local(path));
    }
    if REMOTE_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        return Ok(Target::Remote(url.to_string()));
    }
    for (ws, http) in WEBSOCKET_SCHEMES {
        if let Some(rest) = url.strip_prefix(ws) {
            return Ok(Target::Remote(format!("{http}{rest}")));
        }
    }
    Err(DbError::ConnectionError(format!(
        "unsupported database URL '{url}' (expected libsql://, https://, http://, wss://, ws:// or file:)"
    )))
}

/// Connection string with the auth token appended as a query parameter
/// and masked, suitable for logs.
pub fn redacted_connection_string(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}authToken=***")
}

struct Handle {
    _db: libsql::Database,
    conn: Connection,
}

/// libSQL database backend
pub struct LibsqlBackend {
    handle: Mutex<Option<Handle>>,
}

impl LibsqlBackend {
    /// Open an authenticated connection and verify it with a ping.
    ///
    /// Remote URLs (`libsql://`, `https://`, `http://`) are opened lazily by
    /// the driver, so the ping is what actually reaches the server.
    /// `wss://` and `ws://` are sent over `https://` and `http://`.
    /// `file:<path>` and `:memory:` open a local database and ignore `token`.
    pub async fn connect(url: &str, token: &str) -> DbResult<Self> {
        let db = match classify(url)? {
            Target::Remote(url) => {
                log::info!("Connecting to {}", redacted_connection_string(&url));
                Builder::new_remote(url, token.to_string())
                    .build()
                    .await
            }
            Target::Local(path) => {
                log::info!("Opening local database {path}");
                Builder::new_local(path).build().await
            }
        }
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let backend = Self {
            handle: Mutex::new(Some(Handle { _db: db, conn })),
        };
        backend.ping().await?;
        Ok(backend)
    }

    /// Open a private in-memory database
    pub async fn in_memory() -> DbResult<Self> {
        Self::connect(":memory:", "").await
    }

    fn conn(&self) -> DbResult<Connection> {
        let guard = self
            .handle
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        guard
            .as_ref()
            .map(|h| h.conn.clone())
            .ok_or_else(|| DbError::ConnectionError("connection is closed".to_string()))
    }
}

impl From<libsql::Value> for Value {
    fn from(value: libsql::Value) -> Self {
        match value {
            libsql::Value::Null => Value::Null,
            libsql::Value::Integer(i) => Value::Integer(i),
            libsql::Value::Real(r) => Value::Real(r),
            libsql::Value::Text(s) => Value::Text(s),
            libsql::Value::Blob(b) => Value::Blob(b),
        }
    }
}

#[async_trait]
impl Database for LibsqlBackend {
    async fn ping(&self) -> DbResult<()> {
        let conn = self.conn()?;
        let mut rows = conn
            .query("SELECT 1", ())
            .await
            .map_err(DbError::PingError)?;
        rows.next().await.map_err(DbError::PingError)?;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> DbResult<u64> {
        let conn = self.conn()?;
        conn.execute(sql, ())
            .await
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(sql)
            .await
            .map(|_| ())
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    async fn execute_in_transaction(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        if let Err(e) = tx.execute_batch(sql).await {
            if let Err(rollback_err) = tx.rollback().await {
                log::warn!("ROLLBACK failed: {rollback_err}");
            }
            return Err(DbError::ExecutionError(e.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    async fn query_row(&self, sql: &str) -> DbResult<Option<Vec<Value>>> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(sql, ())
            .await
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::ExecutionError(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut values = Vec::new();
        for idx in 0..row.column_count() {
            let value = row
                .get_value(idx)
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
            values.push(Value::from(value));
        }
        Ok(Some(values))
    }

    fn db_type(&self) -> &'static str {
        "libsql"
    }

    async fn close(&self) -> DbResult<()> {
        let mut guard = self
            .handle
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        if guard.take().is_some() {
            log::debug!("Closed database connection");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
