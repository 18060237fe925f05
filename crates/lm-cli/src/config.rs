//! Validated run configuration built from the command line

use lm_migrate::Direction;
use std::path::PathBuf;
use thiserror::Error;

use crate::cli::Cli;

/// Invalid or missing command-line input, detected before any I/O
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("-{0} flag is required")]
    MissingFlag(&'static str),

    #[error("invalid direction '{0}'. Must be 'up' or 'down'")]
    InvalidDirection(String),

    #[error("steps must be greater than 0 for down migration")]
    InvalidSteps,
}

impl ConfigError {
    /// Whether usage should be printed after the message
    pub fn shows_usage(&self) -> bool {
        matches!(self, ConfigError::MissingFlag(_))
    }
}

/// Immutable configuration for one migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub url: String,
    pub token: String,
    pub migrations_dir: PathBuf,
    pub direction: Direction,
    /// Steps to revert; always positive when `direction` is down
    pub steps: u64,
}

fn required(value: &Option<String>, flag: &'static str) -> Result<String, ConfigError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::MissingFlag(flag)),
    }
}

impl Config {
    /// Validate parsed arguments in the order the flags are documented
    pub fn from_args(args: &Cli) -> Result<Self, ConfigError> {
        let url = required(&args.url, "url")?;
        let token = required(&args.token, "token")?;
        let migrations_dir = PathBuf::from(required(&args.migrations, "migrations")?);

        let direction: Direction = args
            .direction
            .parse()
            .map_err(ConfigError::InvalidDirection)?;

        let steps = u64::try_from(args.steps).unwrap_or(0);
        if direction == Direction::Down && steps == 0 {
            return Err(ConfigError::InvalidSteps);
        }

        Ok(Self {
            url,
            token,
            migrations_dir,
            direction,
            steps,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
