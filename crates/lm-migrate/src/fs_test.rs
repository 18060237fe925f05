use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_dir_fs_reads_relative_to_root() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("migrations")).unwrap();
    fs::write(dir.path().join("migrations/1_a.up.sql"), "SELECT 1;").unwrap();

    let view = DirFs::new(dir.path());
    assert_eq!(view.read_dir("migrations").unwrap(), vec!["1_a.up.sql"]);
    assert_eq!(
        view.read_to_string("migrations/1_a.up.sql").unwrap(),
        "SELECT 1;"
    );
}

#[test]
fn test_dir_fs_mount_renames_directory() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("db_changes");
    fs::create_dir_all(&real).unwrap();
    fs::write(real.join("1_a.up.sql"), "SELECT 1;").unwrap();

    let view = DirFs::mount(&real, "migrations");
    assert_eq!(view.read_dir("migrations").unwrap(), vec!["1_a.up.sql"]);
    assert_eq!(
        view.read_to_string("migrations/1_a.up.sql").unwrap(),
        "SELECT 1;"
    );
    assert!(view.read_dir("elsewhere").is_err());
}

#[test]
fn test_dir_fs_skips_subdirectories() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("1_a.up.sql"), "").unwrap();

    let view = DirFs::mount(dir.path(), "migrations");
    assert_eq!(view.read_dir("migrations").unwrap(), vec!["1_a.up.sql"]);
}

#[test]
fn test_dir_fs_rejects_parent_traversal() {
    let dir = tempdir().unwrap();
    let view = DirFs::mount(dir.path(), "migrations");
    let err = view.read_to_string("migrations/../secret").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn test_for_migrations_prefers_existing_subfolder() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("migrations")).unwrap();
    fs::write(dir.path().join("migrations/2_b.up.sql"), "").unwrap();
    fs::write(dir.path().join("1_a.up.sql"), "").unwrap();

    let view = DirFs::for_migrations(dir.path(), "migrations");
    assert_eq!(view.read_dir("migrations").unwrap(), vec!["2_b.up.sql"]);
}

#[test]
fn test_for_migrations_mounts_flat_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1_a.up.sql"), "").unwrap();

    let view = DirFs::for_migrations(dir.path(), "migrations");
    assert_eq!(view.read_dir("migrations").unwrap(), vec!["1_a.up.sql"]);
}

#[test]
fn test_missing_directory_is_not_found() {
    let dir = tempdir().unwrap();
    let view = DirFs::mount(dir.path().join("absent"), "migrations");
    let err = view.read_dir("migrations").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[test]
fn test_mem_fs_lists_direct_children_only() {
    let mem = MemFs::new()
        .with_file("migrations/1_a.up.sql", "A")
        .with_file("migrations/archive/0_old.up.sql", "old")
        .with_file("other/readme.md", "");

    let mut names = mem.read_dir("migrations").unwrap();
    names.sort();
    assert_eq!(names, vec!["1_a.up.sql"]);
    assert_eq!(mem.read_to_string("migrations/1_a.up.sql").unwrap(), "A");
    assert!(mem.read_dir("absent").is_err());
    assert!(mem.read_to_string("migrations/2_b.up.sql").is_err());
}
