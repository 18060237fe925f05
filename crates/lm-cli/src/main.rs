//! libsql-migrate CLI - apply versioned SQL migrations to a libSQL database

use clap::{CommandFactory, Parser};
use log::LevelFilter;
use std::process::ExitCode;

mod cli;
mod commands;
mod config;

use cli::Cli;
use commands::migrate;
use config::Config;

/// `RUST_LOG` takes precedence over the verbosity flag
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(cli::normalize_args(std::env::args_os()));
    init_logging(cli.verbose);

    let config = match Config::from_args(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.shows_usage() {
                eprintln!("{}", Cli::command().render_help());
            }
            return ExitCode::FAILURE;
        }
    };

    match migrate::execute(&config).await {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
