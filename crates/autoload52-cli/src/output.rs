//! Terminal output helpers.
//!
//! Colors follow `--ansi` / `--no-ansi`, falling back to TTY detection and
//! the `NO_COLOR` environment variable. Status lines go to stdout, problems
//! to stderr.

use autoload52_core::Error as CoreError;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::{IsTerminal, stderr, stdout};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

static COLOR_ENABLED: AtomicBool = AtomicBool::new(true);
static QUIET: AtomicBool = AtomicBool::new(false);
static JSON_OUTPUT: AtomicBool = AtomicBool::new(false);

static IS_TTY: LazyLock<bool> = LazyLock::new(|| stdout().is_terminal() && stderr().is_terminal());

static NO_COLOR: LazyLock<bool> = LazyLock::new(|| std::env::var_os("NO_COLOR").is_some());

/// Initialize output settings from flags and environment.
pub fn init(force_ansi: Option<bool>, quiet: bool, json: bool) {
    let colors = force_ansi.unwrap_or(*IS_TTY && !*NO_COLOR);
    COLOR_ENABLED.store(colors, Ordering::Relaxed);
    QUIET.store(quiet, Ordering::Relaxed);
    JSON_OUTPUT.store(json, Ordering::Relaxed);
    console::set_colors_enabled(colors);
    console::set_colors_enabled_stderr(colors);
}

pub fn colors_enabled() -> bool {
    COLOR_ENABLED.load(Ordering::Relaxed)
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn is_json() -> bool {
    JSON_OUTPUT.load(Ordering::Relaxed)
}

/// Print a styled header line.
pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    if colors_enabled() {
        println!("{} {}", "autoload52".cyan().bold(), text);
    } else {
        println!("autoload52 {text}");
    }
}

/// Print a success message.
pub fn success(text: &str) {
    if is_quiet() {
        return;
    }
    if colors_enabled() {
        println!("{} {}", "✓".green(), text);
    } else {
        println!("OK {text}");
    }
}

/// Print a warning message.
pub fn warning(text: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "!".yellow(), text.yellow());
    } else {
        eprintln!("Warning: {text}");
    }
}

/// Print an error message.
pub fn error(text: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "✗".red(), text.red());
    } else {
        eprintln!("Error: {text}");
    }
}

/// Print an indented `label: value` line.
pub fn detail(label: &str, value: impl std::fmt::Display) {
    if is_quiet() {
        return;
    }
    if colors_enabled() {
        println!("  {} {}", format!("{label}:").dimmed(), value);
    } else {
        println!("  {label}: {value}");
    }
}

/// Format a duration for display.
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        format!("{:.0}us", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else {
        format!("{secs:.2}s")
    }
}

/// JSON-serializable error.
#[derive(Debug, Serialize)]
struct JsonError {
    code: String,
    title: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<String>,
}

impl JsonError {
    fn from_anyhow(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<CoreError>() {
            Some(core) => Self {
                code: core.code().to_string(),
                title: core.code().title().to_string(),
                message: core.to_string(),
                suggestions: core.suggestions().to_vec(),
            },
            None => Self {
                code: "E0000".to_string(),
                title: "Error".to_string(),
                message: format!("{err:#}"),
                suggestions: Vec::new(),
            },
        }
    }
}

/// Report a failed command, as JSON on stdout or as text on stderr.
pub fn print_error(err: &anyhow::Error) {
    if is_json() {
        let wrapped = JsonErrorEnvelope {
            success: false,
            error: JsonError::from_anyhow(err),
        };
        match autoload52_core::to_json_pretty(&wrapped) {
            Ok(json) => println!("{json}"),
            Err(_) => error(&format!("{err:#}")),
        }
        return;
    }

    match err.downcast_ref::<CoreError>() {
        Some(core) => error(&core.display_with_suggestions()),
        None => error(&format!("{err:#}")),
    }
}

#[derive(Debug, Serialize)]
struct JsonErrorEnvelope {
    success: bool,
    error: JsonError,
}
