//! Migrate command implementation

use anyhow::{Context, Result};
use lm_db::{Database, LibsqlBackend};
use lm_migrate::{
    DirFs, Direction, FsSource, MigrateError, Migrator, Outcome, SqliteConfig, SqliteDriver,
    MIGRATIONS_SUBDIR,
};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;

/// Name the migration source is registered under
const SOURCE_NAME: &str = "iofs";

/// Name the database driver is registered under
const DATABASE_NAME: &str = "sqlite3";

/// Execute a migration run, returning the success message to print
pub async fn execute(config: &Config) -> Result<String> {
    let db: Arc<dyn Database> = Arc::new(
        new_db(&config.url, &config.token)
            .await
            .context("failed to create DB connection")?,
    );

    let result = run(config, db.clone()).await;

    if let Err(e) = db.close().await {
        log::warn!("Failed to close database connection: {e}");
    }
    result
}

/// Open an authenticated connection and verify it is alive
async fn new_db(url: &str, token: &str) -> Result<LibsqlBackend> {
    Ok(LibsqlBackend::connect(url, token).await?)
}

/// Wire the engine to `db` and run the configured direction
pub(crate) async fn run(config: &Config, db: Arc<dyn Database>) -> Result<String> {
    let migrator = new_migration(db, &config.migrations_dir)
        .await
        .context("failed to create migration")?;

    let result = dispatch(&migrator, config).await;

    let (source, database) = migrator.close().await;
    if let Err(e) = source {
        log::warn!("Failed to close migration source: {e}");
    }
    if let Err(e) = database {
        log::warn!("Failed to close migration driver: {e}");
    }
    result
}

/// Build a migration engine over `db` and the files in `migrations_dir`
pub(crate) async fn new_migration(db: Arc<dyn Database>, migrations_dir: &Path) -> Result<Migrator> {
    let driver = SqliteDriver::with_instance(db, SqliteConfig::default())
        .await
        .context("failed to create database driver")?;

    let source = FsSource::new(
        DirFs::for_migrations(migrations_dir, MIGRATIONS_SUBDIR),
        MIGRATIONS_SUBDIR,
    )
    .map_err(MigrateError::SourceInit)
    .with_context(|| {
        format!(
            "failed to read migrations from {}",
            migrations_dir.display()
        )
    })?;

    Ok(Migrator::new_with_instance(
        SOURCE_NAME,
        Box::new(source),
        DATABASE_NAME,
        Box::new(driver),
    )?)
}

/// Run the configured direction on an already wired engine
pub(crate) async fn dispatch(migrator: &Migrator, config: &Config) -> Result<String> {
    match config.direction {
        Direction::Up => {
            let outcome = migrator.up().await.context("failed to migrate up")?;
            log_outcome(outcome);
            Ok("Migration up completed successfully".to_string())
        }
        Direction::Down => {
            let steps = i64::try_from(config.steps)
                .with_context(|| format!("step count {} is too large", config.steps))?;
            let outcome = migrator
                .steps(-steps)
                .await
                .with_context(|| format!("failed to migrate down {} steps", config.steps))?;
            log_outcome(outcome);
            Ok(format!(
                "Migration down {} steps completed successfully",
                config.steps
            ))
        }
    }
}

fn log_outcome(outcome: Outcome) {
    match outcome {
        Outcome::NoChange => log::info!("Database already up to date"),
        Outcome::Applied {
            count,
            version: Some(v),
        } => log::info!("Ran {count} migration(s), database now at version {v}"),
        Outcome::Applied {
            count,
            version: None,
        } => log::info!("Ran {count} migration(s), no migrations remain applied"),
    }
}

#[cfg(test)]
#[path = "migrate_test.rs"]
mod tests;
