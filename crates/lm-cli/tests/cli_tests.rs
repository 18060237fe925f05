//! CLI integration tests
//!
//! Runs the compiled `libsql-migrate` binary against a local libSQL file
//! database and checks its output and exit status.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Path to the compiled binary (resolved at compile time)
fn bin() -> String {
    env!("CARGO_BIN_EXE_libsql-migrate").to_string()
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env_remove("LIBSQL_URL")
        .env_remove("LIBSQL_AUTH_TOKEN")
        .env_remove("MIGRATIONS_DIR")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run libsql-migrate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write_migrations(dir: &Path) {
    fs::write(
        dir.join("0001_init.up.sql"),
        "CREATE TABLE users (id INTEGER PRIMARY KEY);",
    )
    .unwrap();
    fs::write(dir.join("0001_init.down.sql"), "DROP TABLE users;").unwrap();
    fs::write(
        dir.join("0002_add_table.up.sql"),
        "CREATE TABLE posts (id INTEGER PRIMARY KEY);",
    )
    .unwrap();
    fs::write(dir.join("0002_add_table.down.sql"), "DROP TABLE posts;").unwrap();
}

// ── Flag validation ────────────────────────────────────────────────────

#[test]
fn test_missing_url_fails_with_usage() {
    let output = run(&["-token", "t", "-migrations", "."]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error: -url flag is required"), "{err}");
    assert!(err.contains("Usage:"), "{err}");
}

#[test]
fn test_missing_token_fails() {
    let output = run(&["-url", "file:unused.db", "-migrations", "."]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: -token flag is required"));
}

#[test]
fn test_missing_migrations_fails_without_touching_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    let url = format!("file:{}", db_path.display());

    let output = run(&["-url", &url, "-token", "t"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: -migrations flag is required"));
    assert!(!db_path.exists(), "validation must fail before connecting");
}

#[test]
fn test_invalid_direction() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    let url = format!("file:{}", db_path.display());

    let output = run(&["-url", &url, "-token", "t", "-migrations", ".", "-direction", "left"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: invalid direction 'left'. Must be 'up' or 'down'"));
    assert!(!db_path.exists());
}

#[test]
fn test_down_with_non_positive_steps() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    let url = format!("file:{}", db_path.display());

    let output = run(&[
        "-url", &url, "-token", "t", "-migrations", ".", "-direction", "down", "-steps", "0",
    ]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: steps must be greater than 0 for down migration"));
    assert!(!db_path.exists());
}

// ── Migration runs ─────────────────────────────────────────────────────

#[test]
fn test_up_then_down_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir_all(&migrations).unwrap();
    write_migrations(&migrations);
    let url = format!("file:{}", dir.path().join("app.db").display());
    let migrations_arg = migrations.display().to_string();

    let output = run(&["-url", &url, "-token", "t", "-migrations", &migrations_arg]);
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        stdout(&output),
        stderr(&output)
    );
    assert!(stdout(&output).contains("Migration up completed successfully"));

    let output = run(&["-url", &url, "-token", "t", "-migrations", &migrations_arg]);
    assert!(output.status.success(), "second up must be a no-op");

    let output = run(&[
        "--url",
        &url,
        "--token",
        "t",
        "--migrations",
        &migrations_arg,
        "--direction",
        "down",
        "--steps",
        "1",
    ]);
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        stdout(&output),
        stderr(&output)
    );
    assert!(stdout(&output).contains("Migration down 1 steps completed successfully"));
}

#[test]
fn test_reverting_too_far_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_migrations(dir.path());
    let url = format!("file:{}", dir.path().join("app.db").display());
    let migrations_arg = dir.path().display().to_string();

    let output = run(&[
        "-url", &url, "-token", "t", "-migrations", &migrations_arg, "-direction", "down",
    ]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error: failed to migrate down 1 steps"), "{err}");
}

#[test]
fn test_unsupported_url_fails_at_connection_stage() {
    let dir = tempfile::tempdir().unwrap();
    write_migrations(dir.path());
    let migrations_arg = dir.path().display().to_string();

    let output = run(&[
        "-url",
        "postgres://localhost/app",
        "-token",
        "t",
        "-migrations",
        &migrations_arg,
    ]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error: failed to create DB connection"), "{err}");
}

#[test]
fn test_unreachable_server_fails_ping() {
    let dir = tempfile::tempdir().unwrap();
    write_migrations(dir.path());
    let migrations_arg = dir.path().display().to_string();

    let output = run(&[
        "-url",
        "http://127.0.0.1:1",
        "-token",
        "t",
        "-migrations",
        &migrations_arg,
    ]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error: failed to create DB connection"), "{err}");
    assert!(err.contains("failed to ping database"), "{err}");
}
