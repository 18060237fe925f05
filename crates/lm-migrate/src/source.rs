//! Migration sources: ordered, versioned up/down scripts.

use crate::error::SourceError;
use crate::fs::MigrationFs;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Logical sub-path the migration files are read from.
pub const MIGRATIONS_SUBDIR: &str = "migrations";

/// Which half of a migration a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(other.to_string()),
        }
    }
}

/// A file name that follows `<version>_<name>.<up|down>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub version: u64,
    pub name: String,
    pub direction: Direction,
}

/// Parse a migration file name.
///
/// Returns `None` for names that are not migrations. Versions must fit in a
/// signed 64-bit integer because that is how they are stored.
pub fn parse_file_name(file_name: &str) -> Option<MigrationFile> {
    let (version, rest) = file_name.split_once('_')?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let version: u64 = version.parse().ok()?;
    if i64::try_from(version).is_err() {
        return None;
    }

    let (stem, ext) = rest.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    let (name, direction) = stem.rsplit_once('.')?;
    let direction = direction.parse().ok()?;

    Some(MigrationFile {
        version,
        name: name.to_string(),
        direction,
    })
}

/// One half of a migration, read from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: u64,
    /// File name the body was read from
    pub identifier: String,
    pub body: String,
}

/// An ordered set of migrations.
///
/// Versions are unique and strictly increasing; `prev` and `next` walk that
/// order.
pub trait MigrationSource: Send + Sync {
    /// Lowest version, or `None` for an empty source.
    fn first(&self) -> Option<u64>;

    fn prev(&self, version: u64) -> Option<u64>;

    fn next(&self, version: u64) -> Option<u64>;

    fn contains(&self, version: u64) -> bool;

    fn read_up(&self, version: u64) -> Result<Migration, SourceError>;

    /// The down half, or `None` if the version cannot be reverted.
    fn read_down(&self, version: u64) -> Result<Option<Migration>, SourceError>;

    fn close(&self) -> Result<(), SourceError>;
}

#[derive(Debug, Default)]
struct Entry {
    up: Option<String>,
    down: Option<String>,
}

/// Migrations listed from a directory of a [`MigrationFs`].
///
/// The directory is indexed once on construction; file bodies are read when
/// a migration is about to run.
pub struct FsSource {
    fs: Box<dyn MigrationFs>,
    path: String,
    index: BTreeMap<u64, Entry>,
    closed: AtomicBool,
}

impl FsSource {
    /// Index the migration files under `path` in `fs`.
    pub fn new(fs: impl MigrationFs + 'static, path: &str) -> Result<Self, SourceError> {
        let path = path.trim_matches('/').to_string();
        let mut names = fs.read_dir(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        names.sort();

        let mut index: BTreeMap<u64, Entry> = BTreeMap::new();
        for file_name in names {
            let Some(file) = parse_file_name(&file_name) else {
                log::debug!("Ignoring {file_name}: not a migration file");
                continue;
            };
            let entry = index.entry(file.version).or_default();
            let slot = match file.direction {
                Direction::Up => &mut entry.up,
                Direction::Down => &mut entry.down,
            };
            if slot.is_some() {
                return Err(SourceError::Duplicate {
                    version: file.version,
                    file_name,
                });
            }
            *slot = Some(file_name);
        }

        if index.is_empty() {
            return Err(SourceError::Empty { path });
        }
        if let Some((version, _)) = index.iter().find(|(_, e)| e.up.is_none()) {
            return Err(SourceError::MissingUp(*version));
        }

        log::debug!("Indexed {} migrations under {path}", index.len());
        Ok(Self {
            fs: Box::new(fs),
            path,
            index,
            closed: AtomicBool::new(false),
        })
    }

    /// Number of versions in the source.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn read(&self, version: u64, file_name: &str) -> Result<Migration, SourceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SourceError::Closed);
        }
        let full_path = format!("{}/{}", self.path, file_name);
        let body = self
            .fs
            .read_to_string(&full_path)
            .map_err(|source| SourceError::Io {
                path: full_path,
                source,
            })?;
        Ok(Migration {
            version,
            identifier: file_name.to_string(),
            body,
        })
    }
}

impl MigrationSource for FsSource {
    fn first(&self) -> Option<u64> {
        self.index.keys().next().copied()
    }

    fn prev(&self, version: u64) -> Option<u64> {
        self.index.range(..version).next_back().map(|(v, _)| *v)
    }

    fn next(&self, version: u64) -> Option<u64> {
        self.index
            .range(version.saturating_add(1)..)
            .next()
            .map(|(v, _)| *v)
            .filter(|v| *v > version)
    }

    fn contains(&self, version: u64) -> bool {
        self.index.contains_key(&version)
    }

    fn read_up(&self, version: u64) -> Result<Migration, SourceError> {
        let file_name = self
            .index
            .get(&version)
            .and_then(|e| e.up.as_deref())
            .ok_or(SourceError::NotFound(version))?;
        self.read(version, file_name)
    }

    fn read_down(&self, version: u64) -> Result<Option<Migration>, SourceError> {
        let entry = self
            .index
            .get(&version)
            .ok_or(SourceError::NotFound(version))?;
        match entry.down.as_deref() {
            Some(file_name) => self.read(version, file_name).map(Some),
            None => Ok(None),
        }
    }

    fn close(&self) -> Result<(), SourceError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
