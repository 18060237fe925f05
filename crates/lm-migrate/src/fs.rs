//! Read-only filesystem views that migration sources are built on.
//!
//! Paths handed to a [`MigrationFs`] are logical, `/`-separated and relative
//! to the view's root, so the same source code reads from a real directory
//! ([`DirFs`]) or from memory ([`MemFs`]).

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// A read-only tree of migration files.
pub trait MigrationFs: Send + Sync {
    /// Names of the regular files directly under `path`.
    fn read_dir(&self, path: &str) -> io::Result<Vec<String>>;

    /// Full contents of the file at `path`.
    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// A view over a directory on disk.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
    /// Logical name the root is mounted under, if any.
    mount: Option<String>,
}

impl DirFs {
    /// Logical `a/b` maps to `root/a/b`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mount: None,
        }
    }

    /// `dir` itself appears at logical path `name`, whatever its real name.
    pub fn mount(dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            root: dir.into(),
            mount: Some(name.trim_matches('/').to_string()),
        }
    }

    /// View in which the migrations can be read at logical path `name`.
    ///
    /// Uses `dir/name` when that folder exists, otherwise mounts `dir`
    /// itself under `name`.
    pub fn for_migrations(dir: &Path, name: &str) -> Self {
        if dir.join(name).is_dir() {
            Self::new(dir)
        } else {
            Self::mount(dir, name)
        }
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let path = path.trim_matches('/');
        let relative = match &self.mount {
            None => path,
            Some(mount) if path == mount.as_str() => "",
            Some(mount) => path
                .strip_prefix(mount.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("{path} is outside mount '{mount}'"),
                    )
                })?,
        };
        if relative.split('/').any(|part| part == "..") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid path {path}"),
            ));
        }
        Ok(if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        })
    }
}

impl MigrationFs for DirFs {
    fn read_dir(&self, path: &str) -> io::Result<Vec<String>> {
        let dir = self.resolve(path)?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => log::debug!("Skipping non UTF-8 file name {:?}", name),
            }
        }
        Ok(names)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(path)?)
    }
}

/// An in-memory file tree, keyed by logical path.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: BTreeMap<String, String>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemFs::insert`].
    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: &str, contents: &str) {
        self.files
            .insert(path.trim_matches('/').to_string(), contents.to_string());
    }
}

impl MigrationFs for MemFs {
    fn read_dir(&self, path: &str) -> io::Result<Vec<String>> {
        let prefix = format!("{}/", path.trim_matches('/'));
        let mut found_dir = false;
        let mut names = Vec::new();
        for key in self.files.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                found_dir = true;
                if !rest.contains('/') {
                    names.push(rest.to_string());
                }
            }
        }
        if !found_dir {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{path} does not exist"),
            ));
        }
        Ok(names)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path.trim_matches('/'))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }
}

#[cfg(test)]
#[path = "fs_test.rs"]
mod tests;
