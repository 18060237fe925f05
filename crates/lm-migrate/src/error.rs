//! Error types for the migration engine.

use lm_db::DbError;
use std::io;
use thiserror::Error;

/// Errors raised while reading migration files.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The migrations path could not be listed or a file could not be read.
    #[error("cannot read {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The migrations path holds no up or down migration files.
    #[error("no migration files found in {path}")]
    Empty { path: String },

    /// Two files share the same version and direction.
    #[error("duplicate migration file: {file_name} (version {version})")]
    Duplicate { version: u64, file_name: String },

    /// A version has a down file but no up file.
    #[error("version {0} has a down migration but no up migration")]
    MissingUp(u64),

    /// No file exists for the requested version.
    #[error("no migration found for version {0}")]
    NotFound(u64),

    /// The source was closed and can no longer be read.
    #[error("migration source is closed")]
    Closed,
}

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The migration source could not be opened (M001).
    #[error("[M001] Migration source could not be opened")]
    SourceInit(#[source] SourceError),

    /// The engine rejected the source or driver it was given (M002).
    #[error("[M002] Migration engine rejected its inputs: {0}")]
    Wiring(String),

    /// A previous run stopped half way through a migration (M003).
    #[error("[M003] Dirty database version {}. Fix and force version.", display_version(.version))]
    Dirty { version: Option<u64> },

    /// A migration body failed; the version record is left dirty (M004).
    #[error("[M004] Migration {version} failed")]
    Execution {
        version: u64,
        #[source]
        source: DbError,
    },

    /// Reading or writing the version record failed (M005).
    #[error("[M005] Database error")]
    Database(#[from] DbError),

    /// Fewer migrations exist than the requested step count (M006).
    #[error("[M006] Requested {requested} migration steps but only {available} available")]
    ShortLimit { requested: u64, available: u64 },

    /// A version cannot be reverted because it has no down file (M007).
    #[error("[M007] No down migration for version {0}")]
    MissingDown(u64),

    /// The database is at a version the source knows nothing about (M008).
    #[error("[M008] Database version {0} has no migration file")]
    UnknownVersion(u64),

    /// A step count of zero was requested (M009).
    #[error("[M009] Step count must not be zero")]
    InvalidSteps,

    /// Reading a migration file failed after the source was opened (M010).
    #[error("[M010] Migration source error")]
    Source(#[from] SourceError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

fn display_version(version: &Option<u64>) -> String {
    match version {
        Some(v) => v.to_string(),
        None => "-1".to_string(),
    }
}
