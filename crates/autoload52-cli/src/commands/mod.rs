//! Command definitions.

pub mod dump_autoload;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// autoload52 - Composer autoloaders for PHP 5.2
///
/// Reads composer.json and the installed package list, then writes an
/// autoloader that runs on PHP 5.2 next to Composer's own.
#[derive(Parser, Debug)]
#[command(name = "autoload52")]
#[command(author = "autoload52 Contributors")]
#[command(version)]
#[command(about = "Generates PHP 5.2 compatible Composer autoloaders", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
#[command(styles = get_styles())]
pub struct Cli {
    /// Do not output any message
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Force ANSI output (colors and formatting)
    #[arg(long, global = true, conflicts_with = "no_ansi")]
    pub ansi: bool,

    /// Disable ANSI output (colors and formatting)
    #[arg(long, global = true)]
    pub no_ansi: bool,

    /// Use the specified directory as working directory
    #[arg(short = 'd', long = "working-dir", global = true, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Increase the verbosity of messages: -v for verbose, -vv for very verbose, -vvv for debug
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Explicit color choice, if any.
    pub const fn ansi_choice(&self) -> Option<bool> {
        if self.ansi {
            Some(true)
        } else if self.no_ansi {
            Some(false)
        } else {
            None
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dumps the PHP 5.2 autoloader
    #[command(alias = "dumpautoload")]
    DumpAutoload(dump_autoload::DumpAutoloadArgs),
}

/// Output format for commands that support it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Get clap styles for colored help
const fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Green.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Green.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default())
        .placeholder(clap::builder::styling::AnsiColor::Yellow.on_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dump_autoload_flags() {
        let cli = Cli::parse_from([
            "autoload52",
            "-d",
            "/srv/app",
            "dump-autoload",
            "-o",
            "--suffix",
            "abc",
            "--target-dir",
            "composer52",
        ]);
        assert_eq!(cli.working_dir, Some(PathBuf::from("/srv/app")));
        let Commands::DumpAutoload(args) = cli.command;
        assert!(args.optimize);
        assert_eq!(args.suffix.as_deref(), Some("abc"));
        assert_eq!(args.target_dir.as_deref(), Some("composer52"));
        assert_eq!(args.vendor_dir, None);
    }

    #[test]
    fn test_dumpautoload_alias() {
        let cli = Cli::parse_from(["autoload52", "dumpautoload", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::DumpAutoload(_)));
    }
}
