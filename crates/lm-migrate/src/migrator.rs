//! The migration runner.
//!
//! Every migration is applied in three writes: the version record is set to
//! the target version marked dirty, the body runs, and the record is marked
//! clean. A run that dies in between leaves the record dirty, and every later
//! run refuses to start until an operator repairs it.

use crate::driver::{MigrationDriver, VersionState};
use crate::error::{MigrateError, MigrateResult};
use crate::source::{Migration, MigrationSource};

/// What an `up` or `steps` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was pending.
    NoChange,
    /// `count` migrations ran; the database is now at `version`.
    Applied { count: usize, version: Option<u64> },
}

/// A planned step: the migration to run and the version it leaves behind.
struct Step {
    migration: Migration,
    target: Option<u64>,
}

/// Migration engine over a source and a driver.
pub struct Migrator {
    source_name: String,
    db_name: String,
    source: Box<dyn MigrationSource>,
    driver: Box<dyn MigrationDriver>,
}

impl Migrator {
    /// Compose an engine from an opened source and driver.
    ///
    /// The names identify each side in logs and must be distinct.
    pub fn new_with_instance(
        source_name: &str,
        source: Box<dyn MigrationSource>,
        db_name: &str,
        driver: Box<dyn MigrationDriver>,
    ) -> MigrateResult<Self> {
        if source_name.is_empty() || db_name.is_empty() {
            return Err(MigrateError::Wiring(
                "source and database names must not be empty".to_string(),
            ));
        }
        if source_name == db_name {
            return Err(MigrateError::Wiring(format!(
                "source and database are both named '{source_name}'"
            )));
        }
        log::debug!(
            "Migrating {db_name} ({}) from {source_name}",
            driver.name()
        );
        Ok(Self {
            source_name: source_name.to_string(),
            db_name: db_name.to_string(),
            source,
            driver,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Current version record, dirty or not.
    pub async fn version(&self) -> MigrateResult<VersionState> {
        Ok(self.driver.version().await?)
    }

    /// Apply every pending up migration in ascending order.
    pub async fn up(&self) -> MigrateResult<Outcome> {
        let current = self.current_version().await?;
        let plan = self.plan_up(current, None)?;
        if plan.is_empty() {
            log::info!("No pending migrations");
            return Ok(Outcome::NoChange);
        }
        self.execute(plan).await
    }

    /// Apply `n` up migrations if positive, revert `|n|` if negative.
    ///
    /// Nothing runs unless all `|n|` steps exist.
    pub async fn steps(&self, n: i64) -> MigrateResult<Outcome> {
        if n == 0 {
            return Err(MigrateError::InvalidSteps);
        }
        let requested = n.unsigned_abs();
        let limit = usize::try_from(requested).unwrap_or(usize::MAX);

        let current = self.current_version().await?;
        let plan = if n > 0 {
            self.plan_up(current, Some(limit))?
        } else {
            self.plan_down(current, limit)?
        };

        if (plan.len() as u64) < requested {
            return Err(MigrateError::ShortLimit {
                requested,
                available: plan.len() as u64,
            });
        }
        self.execute(plan).await
    }

    /// Close source and driver, returning both results.
    pub async fn close(self) -> (MigrateResult<()>, MigrateResult<()>) {
        let source = self.source.close().map_err(MigrateError::from);
        let database = self.driver.close().await.map_err(MigrateError::from);
        (source, database)
    }

    /// Read the version record, refusing dirty or unknown versions.
    async fn current_version(&self) -> MigrateResult<Option<u64>> {
        let state = self.driver.version().await?;
        if state.dirty {
            return Err(MigrateError::Dirty {
                version: state.version,
            });
        }
        if let Some(version) = state.version {
            if !self.source.contains(version) {
                return Err(MigrateError::UnknownVersion(version));
            }
        }
        Ok(state.version)
    }

    fn plan_up(&self, current: Option<u64>, limit: Option<usize>) -> MigrateResult<Vec<Step>> {
        let mut plan = Vec::new();
        let mut next = match current {
            None => self.source.first(),
            Some(v) => self.source.next(v),
        };
        while let Some(version) = next {
            if limit.is_some_and(|l| plan.len() >= l) {
                break;
            }
            plan.push(Step {
                migration: self.source.read_up(version)?,
                target: Some(version),
            });
            next = self.source.next(version);
        }
        Ok(plan)
    }

    fn plan_down(&self, current: Option<u64>, limit: usize) -> MigrateResult<Vec<Step>> {
        let mut plan = Vec::new();
        let mut cursor = current;
        while let Some(version) = cursor {
            if plan.len() >= limit {
                break;
            }
            let migration = self
                .source
                .read_down(version)?
                .ok_or(MigrateError::MissingDown(version))?;
            let target = self.source.prev(version);
            plan.push(Step { migration, target });
            cursor = target;
        }
        Ok(plan)
    }

    async fn execute(&self, plan: Vec<Step>) -> MigrateResult<Outcome> {
        let count = plan.len();
        let mut version = None;
        for step in plan {
            let Step { migration, target } = step;
            log::info!("Running {}", migration.identifier);

            self.driver.set_version(target, true).await?;
            self.driver
                .run(&migration)
                .await
                .map_err(|source| MigrateError::Execution {
                    version: migration.version,
                    source,
                })?;
            self.driver.set_version(target, false).await?;
            version = target;
        }
        Ok(Outcome::Applied { count, version })
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
