//! Error types for autoload52 operations.
//!
//! Each error has:
//! - A unique error code (e.g., E0201) for easy reference and searching
//! - A clear error message explaining what went wrong
//! - Suggestions for how to fix the issue

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for autoload52 errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration errors (E01xx)
    /// Vendor directory missing or not creatable
    E0101,
    /// Invalid configuration value
    E0102,

    // Resolution errors (E02xx)
    /// Path does not exist at resolution time
    E0201,
    /// Path is not absolute
    E0202,

    // Scan errors (E03xx)
    /// Class source could not be read
    E0301,

    // IO errors (E04xx)
    /// File not found
    E0401,
    /// Permission denied
    E0402,
    /// Write failed
    E0403,

    // Template errors (E05xx)
    /// Unbound or unknown placeholder
    E0501,
    /// Value cannot be rendered as generated code
    E0502,

    // Manifest errors (E06xx)
    /// Invalid composer.json or installed.json
    E0601,
    /// Invalid JSON syntax
    E0602,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0301 => "E0301",
            Self::E0401 => "E0401",
            Self::E0402 => "E0402",
            Self::E0403 => "E0403",
            Self::E0501 => "E0501",
            Self::E0502 => "E0502",
            Self::E0601 => "E0601",
            Self::E0602 => "E0602",
        }
    }

    /// Get a brief title for this error code.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::E0101 => "Vendor directory unavailable",
            Self::E0102 => "Invalid configuration",
            Self::E0201 => "Path not found",
            Self::E0202 => "Path not absolute",
            Self::E0301 => "Scan failed",
            Self::E0401 => "File not found",
            Self::E0402 => "Permission denied",
            Self::E0403 => "Write failed",
            Self::E0501 => "Template placeholder mismatch",
            Self::E0502 => "Unrenderable value",
            Self::E0601 => "Invalid manifest",
            Self::E0602 => "JSON syntax error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for autoload52.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("[{code}] configuration error: {message}")]
    Config {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// Configuration key (if applicable).
        key: Option<String>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Path expression could not be computed.
    #[error("[{code}] cannot resolve path {path}: {message}")]
    Resolution {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// The offending path.
        path: String,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Class scan failed on an existing source.
    #[error("[{code}] scan error at {path}: {message}")]
    Scan {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// File or directory being scanned.
        path: PathBuf,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// IO error.
    #[error("[{code}] io error at {path}: {message}")]
    Io {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Generated code could not be rendered.
    #[error("[{code}] template '{template}': {message}")]
    Template {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Template or artifact name.
        template: String,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Invalid manifest.
    #[error("[{code}] invalid manifest: {message}")]
    InvalidManifest {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// File path.
        path: Option<PathBuf>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// JSON error.
    #[error("[E0602] json error: {0}")]
    Json(#[from] sonic_rs::Error),
}

/// Wrapper to make `ErrorCode` usable as a source.
#[derive(Debug)]
pub struct ErrorCodeSource(pub ErrorCode);

impl fmt::Display for ErrorCodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

impl std::error::Error for ErrorCodeSource {}

impl Error {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config { code, .. }
            | Self::Resolution { code, .. }
            | Self::Scan { code, .. }
            | Self::Io { code, .. }
            | Self::Template { code, .. }
            | Self::InvalidManifest { code, .. } => code.0,
            Self::Json(_) => ErrorCode::E0602,
        }
    }

    /// Get suggestions for fixing this error.
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Config { suggestions, .. }
            | Self::Resolution { suggestions, .. }
            | Self::Scan { suggestions, .. }
            | Self::Io { suggestions, .. }
            | Self::Template { suggestions, .. }
            | Self::InvalidManifest { suggestions, .. } => suggestions,
            Self::Json(_) => &[],
        }
    }

    /// Create an IO error with context.
    #[must_use]
    #[allow(clippy::needless_pass_by_value)]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let (code, suggestions) = match err.kind() {
            std::io::ErrorKind::NotFound => (
                ErrorCode::E0401,
                vec![
                    format!("Check if the path exists: {}", path.display()),
                    "Verify you're in the correct directory".to_string(),
                ],
            ),
            std::io::ErrorKind::PermissionDenied => (
                ErrorCode::E0402,
                vec![
                    format!("Check permissions on: {}", path.display()),
                    "On Unix, check file ownership with 'ls -la'".to_string(),
                ],
            ),
            _ => (
                ErrorCode::E0401,
                vec![format!("Check the file: {}", path.display())],
            ),
        };
        Self::Io {
            code: ErrorCodeSource(code),
            path,
            message: err.to_string(),
            suggestions,
        }
    }

    /// Create a write error. Writes abort the run, so the suggestion points
    /// at regenerating once the cause is fixed.
    #[must_use]
    #[allow(clippy::needless_pass_by_value)]
    pub fn write(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let code = if err.kind() == std::io::ErrorKind::PermissionDenied {
            ErrorCode::E0402
        } else {
            ErrorCode::E0403
        };
        Self::Io {
            code: ErrorCodeSource(code),
            suggestions: vec![
                format!("Check that {} is writable", path.display()),
                "Generated files may be inconsistent; rerun dump-autoload".to_string(),
            ],
            path,
            message: err.to_string(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCodeSource(ErrorCode::E0102),
            message: message.into(),
            key: None,
            suggestions: vec!["Check the config section of composer.json".to_string()],
        }
    }

    /// Create a configuration error tied to a specific key.
    #[must_use]
    pub fn config_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        let key = key.into();
        Self::Config {
            code: ErrorCodeSource(ErrorCode::E0102),
            message: message.into(),
            suggestions: vec![format!("Check the value of '{key}'")],
            key: Some(key),
        }
    }

    /// Create an error for a vendor directory that cannot be used.
    #[must_use]
    #[allow(clippy::needless_pass_by_value)]
    pub fn vendor_dir(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        Self::Config {
            code: ErrorCodeSource(ErrorCode::E0101),
            message: format!("vendor directory {} is unusable: {err}", path.display()),
            key: Some("vendor-dir".to_string()),
            suggestions: vec![
                format!("Create {} or fix its permissions", path.display()),
                "Set config.vendor-dir in composer.json or COMPOSER_VENDOR_DIR".to_string(),
            ],
        }
    }

    /// Create a resolution error for a path that does not exist.
    #[must_use]
    pub fn path_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::Resolution {
            code: ErrorCodeSource(ErrorCode::E0201),
            suggestions: vec![format!("Create the directory first: {path}")],
            path,
            message: "path does not exist".to_string(),
        }
    }

    /// Create a resolution error for a relative path where an absolute one is required.
    #[must_use]
    pub fn not_absolute(path: impl Into<String>) -> Self {
        Self::Resolution {
            code: ErrorCodeSource(ErrorCode::E0202),
            path: path.into(),
            message: "path must be absolute".to_string(),
            suggestions: vec!["Resolve the path against the working directory".to_string()],
        }
    }

    /// Create a scan error.
    #[must_use]
    pub fn scan(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self::Scan {
            code: ErrorCodeSource(ErrorCode::E0301),
            suggestions: vec![format!("Check that {} is readable", path.display())],
            path,
            message: message.into(),
        }
    }

    /// Create a template error for a placeholder mismatch.
    #[must_use]
    pub fn placeholder(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            code: ErrorCodeSource(ErrorCode::E0501),
            template: template.into(),
            message: message.into(),
            suggestions: vec!["This is a bug in autoload52; please report it".to_string()],
        }
    }

    /// Create a template error for a value that cannot be embedded.
    #[must_use]
    pub fn unrenderable(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            code: ErrorCodeSource(ErrorCode::E0502),
            template: template.into(),
            message: message.into(),
            suggestions: vec![
                "Check package names, namespaces and paths for control characters".to_string(),
            ],
        }
    }

    /// Create an invalid manifest error.
    #[must_use]
    pub fn invalid_manifest(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        let suggestions = match &path {
            Some(p) => vec![
                format!("Validate {} with 'composer validate'", p.display()),
                "Reinstall dependencies to regenerate installed.json".to_string(),
            ],
            None => vec!["Validate the manifest JSON".to_string()],
        };
        Self::InvalidManifest {
            code: ErrorCodeSource(ErrorCode::E0601),
            message: message.into(),
            path,
            suggestions,
        }
    }

    /// Format the error with suggestions for display.
    #[must_use]
    pub fn display_with_suggestions(&self) -> String {
        let mut output = format!("{self}");
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                output.push_str(&format!("\n  - {suggestion}"));
            }
        }
        output
    }
}

/// Result type for autoload52 operations.
pub type Result<T> = std::result::Result<T, Error>;
