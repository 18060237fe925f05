//! CLI argument definitions using clap derive API

use clap::{ArgAction, Parser};
use std::ffi::OsString;

/// Long flags the original single-dash spelling (`-url`) is accepted for
const LONG_FLAGS: &[&str] = &[
    "url",
    "token",
    "migrations",
    "direction",
    "steps",
    "verbose",
    "help",
    "version",
];

/// libsql-migrate - apply versioned SQL migrations to a libSQL database
#[derive(Parser, Debug)]
#[command(name = "libsql-migrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// LibSQL database URL (required)
    #[arg(long, env = "LIBSQL_URL")]
    pub url: Option<String>,

    /// LibSQL authentication token (required)
    #[arg(long, env = "LIBSQL_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to migrations directory (required)
    #[arg(long, env = "MIGRATIONS_DIR")]
    pub migrations: Option<String>,

    /// Migration direction: up or down
    #[arg(long, default_value = "up")]
    pub direction: String,

    /// Number of steps for down migration
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub steps: i64,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Rewrite single-dash long flags (`-url x`, `-steps=2`) to `--url x`,
/// `--steps=2`. Short flags and negative numbers pass through untouched.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(idx, arg)| {
            if idx == 0 {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(flag) = text.strip_prefix('-') else {
                return arg;
            };
            if flag.starts_with('-') {
                return arg;
            }
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
