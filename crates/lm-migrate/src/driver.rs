//! Migration drivers: where the schema version record lives.
//!
//! The record is a single row `(version, dirty)` in `schema_migrations`.
//! No row means no migration has been applied. A dirty record without a
//! version is stored as version `-1`.

use crate::error::{MigrateError, MigrateResult};
use crate::source::Migration;
use async_trait::async_trait;
use lm_db::{Database, DbError, DbResult};
use std::sync::Arc;

/// Table the version record is kept in unless configured otherwise.
pub const DEFAULT_MIGRATIONS_TABLE: &str = "schema_migrations";

/// Persisted schema version state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionState {
    /// Last applied version, `None` before the first migration.
    pub version: Option<u64>,
    /// Set while a migration is running; left set if it failed.
    pub dirty: bool,
}

impl VersionState {
    pub fn clean(version: u64) -> Self {
        Self {
            version: Some(version),
            dirty: false,
        }
    }
}

/// Database side of the migration engine.
#[async_trait]
pub trait MigrationDriver: Send + Sync {
    /// Read the current version record.
    async fn version(&self) -> DbResult<VersionState>;

    /// Replace the version record.
    async fn set_version(&self, version: Option<u64>, dirty: bool) -> DbResult<()>;

    /// Execute one migration body.
    async fn run(&self, migration: &Migration) -> DbResult<()>;

    async fn close(&self) -> DbResult<()>;

    /// Driver name for logging
    fn name(&self) -> &'static str;
}

/// Configuration for [`SqliteDriver`].
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub migrations_table: String,
    /// Run bodies as-is instead of wrapping each in a transaction, for
    /// migrations that manage their own `BEGIN`/`COMMIT`.
    pub no_tx_wrap: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            migrations_table: DEFAULT_MIGRATIONS_TABLE.to_string(),
            no_tx_wrap: false,
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Driver for SQLite-dialect databases, libSQL included.
pub struct SqliteDriver {
    db: Arc<dyn Database>,
    config: SqliteConfig,
}

impl SqliteDriver {
    /// Wrap an open database, creating the version table if needed.
    pub async fn with_instance(db: Arc<dyn Database>, config: SqliteConfig) -> MigrateResult<Self> {
        if !is_identifier(&config.migrations_table) {
            return Err(MigrateError::Wiring(format!(
                "invalid migrations table name '{}'",
                config.migrations_table
            )));
        }
        db.ping().await?;

        let driver = Self { db, config };
        driver.ensure_version_table().await?;
        Ok(driver)
    }

    async fn ensure_version_table(&self) -> DbResult<()> {
        let table = &self.config.migrations_table;
        self.db
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (version uint64, dirty bool);
                 CREATE UNIQUE INDEX IF NOT EXISTS version_unique ON {table} (version);"
            ))
            .await
    }
}

#[async_trait]
impl MigrationDriver for SqliteDriver {
    async fn version(&self) -> DbResult<VersionState> {
        let table = &self.config.migrations_table;
        let Some(row) = self
            .db
            .query_row(&format!("SELECT version, dirty FROM {table} LIMIT 1"))
            .await?
        else {
            return Ok(VersionState::default());
        };

        let version = match row.first() {
            Some(lm_db::Value::Null) | None => None,
            Some(value) => {
                let raw = value.as_i64().ok_or_else(|| {
                    DbError::ExecutionError(format!("unexpected version value {value:?} in {table}"))
                })?;
                u64::try_from(raw).ok()
            }
        };
        let dirty = row.get(1).and_then(|v| v.as_i64()).unwrap_or(0) != 0;
        Ok(VersionState { version, dirty })
    }

    async fn set_version(&self, version: Option<u64>, dirty: bool) -> DbResult<()> {
        let table = &self.config.migrations_table;
        let mut sql = format!("DELETE FROM {table};");
        if version.is_some() || dirty {
            let stored = match version {
                Some(v) => i64::try_from(v).map_err(|_| {
                    DbError::ExecutionError(format!("version {v} does not fit in {table}"))
                })?,
                None => -1,
            };
            sql.push_str(&format!(
                "\nINSERT INTO {table} (version, dirty) VALUES ({stored}, {});",
                i32::from(dirty)
            ));
        }
        self.db.execute_in_transaction(&sql).await
    }

    async fn run(&self, migration: &Migration) -> DbResult<()> {
        if migration.body.trim().is_empty() {
            log::debug!("{} is empty, nothing to execute", migration.identifier);
            return Ok(());
        }
        if self.config.no_tx_wrap {
            self.db.execute_batch(&migration.body).await
        } else {
            self.db.execute_in_transaction(&migration.body).await
        }
    }

    async fn close(&self) -> DbResult<()> {
        self.db.close().await
    }

    fn name(&self) -> &'static str {
        self.db.db_type()
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
