//! Migration engine for libsql-migrate.
//!
//! Reads an ordered set of `<version>_<name>.<up|down>.sql` files through a
//! [`MigrationSource`], tracks the applied version in the target database
//! through a [`MigrationDriver`], and applies or reverts them with
//! [`Migrator`].

pub mod driver;
pub mod error;
pub mod fs;
pub mod memory;
pub mod migrator;
pub mod source;

pub use driver::{MigrationDriver, SqliteConfig, SqliteDriver, VersionState};
pub use error::{MigrateError, MigrateResult, SourceError};
pub use fs::{DirFs, MemFs, MigrationFs};
pub use memory::MemoryDriver;
pub use migrator::{Migrator, Outcome};
pub use source::{
    parse_file_name, Direction, FsSource, Migration, MigrationFile, MigrationSource,
    MIGRATIONS_SUBDIR,
};
