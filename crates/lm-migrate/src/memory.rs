//! In-memory [`MigrationDriver`] that records what it was asked to do.
//!
//! Useful for dry runs and for exercising the engine without a database.

use crate::driver::{MigrationDriver, VersionState};
use crate::source::Migration;
use async_trait::async_trait;
use lm_db::{DbError, DbResult};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    version: VersionState,
    /// Every record written, in order
    history: Vec<VersionState>,
    /// Identifiers of executed migrations, in order
    executed: Vec<String>,
    fail_on: Option<String>,
    closed: bool,
}

/// Driver keeping the version record in memory.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    state: Mutex<MemoryState>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing version record.
    pub fn with_state(state: VersionState) -> Self {
        let driver = Self::default();
        if let Ok(mut guard) = driver.state.lock() {
            guard.version = state;
        }
        driver
    }

    /// Make `run` fail for any migration whose body contains `needle`.
    pub fn fail_on(self, needle: &str) -> Self {
        if let Ok(mut guard) = self.state.lock() {
            guard.fail_on = Some(needle.to_string());
        }
        self
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Current version record.
    pub fn state(&self) -> DbResult<VersionState> {
        Ok(self.lock()?.version)
    }

    /// Identifiers of the migrations executed so far.
    pub fn executed(&self) -> DbResult<Vec<String>> {
        Ok(self.lock()?.executed.clone())
    }

    /// Every version record written so far.
    pub fn history(&self) -> DbResult<Vec<VersionState>> {
        Ok(self.lock()?.history.clone())
    }

    pub fn is_closed(&self) -> DbResult<bool> {
        Ok(self.lock()?.closed)
    }

    fn open(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        let guard = self.lock()?;
        if guard.closed {
            return Err(DbError::ConnectionError("connection is closed".to_string()));
        }
        Ok(guard)
    }
}

#[async_trait]
impl MigrationDriver for MemoryDriver {
    async fn version(&self) -> DbResult<VersionState> {
        Ok(self.open()?.version)
    }

    async fn set_version(&self, version: Option<u64>, dirty: bool) -> DbResult<()> {
        let mut guard = self.open()?;
        let state = VersionState { version, dirty };
        guard.version = state;
        guard.history.push(state);
        Ok(())
    }

    async fn run(&self, migration: &Migration) -> DbResult<()> {
        let mut guard = self.open()?;
        if let Some(needle) = &guard.fail_on {
            if migration.body.contains(needle.as_str()) {
                return Err(DbError::ExecutionError(format!(
                    "{} failed on '{needle}'",
                    migration.identifier
                )));
            }
        }
        guard.executed.push(migration.identifier.clone());
        Ok(())
    }

    async fn close(&self) -> DbResult<()> {
        self.lock()?.closed = true;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
