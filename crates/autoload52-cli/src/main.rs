//! autoload52 CLI - PHP 5.2 compatible Composer autoloaders.
//!
//! Reads the root `composer.json` and `vendor/composer/installed.json` and
//! writes an autoloader that PHP 5.2 can load, alongside the one Composer
//! generates.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod output;

use clap::Parser;
use commands::{Cli, Commands, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_ansi)
        .with_target(false)
        .without_time()
        .init();

    output::init(
        cli.ansi_choice(),
        cli.quiet,
        matches!(cli.format, OutputFormat::Json),
    );

    match run_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let working_dir = match &cli.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let working_dir = absolute(working_dir)?;

    match &cli.command {
        Commands::DumpAutoload(args) => {
            commands::dump_autoload::run(args, &working_dir, cli.format)
        }
    }
}

/// Anchor a relative `--working-dir` on the process working directory.
fn absolute(dir: PathBuf) -> anyhow::Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir);
    }
    Ok(std::env::current_dir()?.join(dir))
}
