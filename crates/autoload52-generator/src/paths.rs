//! Path normalization and the relocatable path expressions embedded in
//! generated files.
//!
//! All functions here work on `/`-separated strings. Generated code has to
//! run on whatever machine the project ends up on, so paths are compared
//! lexically and only turned into PHP expressions relative to either the
//! emitting file or one of the two symbolic roots (`$vendorDir`, `$baseDir`).

use crate::php::{PhpExpr, Variable};
use autoload52_core::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Stream or drive prefix kept verbatim by [`normalize_path`].
static PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[0-9a-z]+:(?://(?:[a-z]:)?)?").unwrap());

/// Normalize a path: unify separators, drop `.` and empty segments, and
/// resolve `..` where there is something to pop.
///
/// Leading `..` segments of a relative path are kept.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (prefix, rest) = match PREFIX.find(&path) {
        Some(m) => path.split_at(m.end()),
        None => ("", path.as_str()),
    };
    let (absolute, rest) = match rest.strip_prefix('/') {
        Some(stripped) => (true, stripped),
        None => (false, rest),
    };

    let mut parts: Vec<&str> = Vec::new();
    let mut can_pop = false;
    for chunk in rest.split('/') {
        if chunk == ".." && (absolute || can_pop) {
            parts.pop();
            can_pop = parts.last().is_some_and(|p| *p != "..");
        } else if chunk != "." && !chunk.is_empty() {
            parts.push(chunk);
            can_pop = chunk != "..";
        }
    }

    let mut out = String::with_capacity(path.len());
    out.push_str(prefix);
    if absolute {
        out.push('/');
    }
    out.push_str(&parts.join("/"));
    out
}

/// Check if a path is absolute on either Unix or Windows.
#[must_use]
pub fn is_absolute_path(path: &str) -> bool {
    path.starts_with('/') || path.get(1..2) == Some(":") || path.starts_with("\\\\")
}

/// Parent directory with PHP `dirname()` semantics.
pub(crate) fn dirname(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        None => ".".to_string(),
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches('/');
            if parent.is_empty() {
                "/".to_string()
            } else {
                parent.to_string()
            }
        }
    }
}

fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

fn lcfirst(path: &str) -> String {
    let mut chars = path.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_drive_root(path: &str) -> bool {
    let bytes = path.as_bytes();
    matches!(bytes, [d, b':'] | [d, b':', b'/'] if d.is_ascii_alphabetic())
}

fn ensure_absolute(path: &str) -> Result<()> {
    if is_absolute_path(path) {
        Ok(())
    } else {
        Err(Error::not_absolute(path))
    }
}

/// Walk up from `to` until reaching a directory that also contains `from`.
fn common_root(from: &str, to: &str) -> String {
    let from = format!("{from}/");
    let mut common = to.to_string();
    while !from.starts_with(&format!("{common}/"))
        && common != "/"
        && common != "."
        && !is_drive_root(&common)
    {
        common = dirname(&common);
    }
    common
}

/// Shared-root check: `None` when the two paths only share the filesystem
/// root, in which case the target stays absolute.
fn shared_root(from: &str, to: &str) -> Option<String> {
    let common = common_root(from, to);
    if !from.starts_with(&common) || common == "/" || common == "." {
        return None;
    }
    Some(format!("{}/", common.trim_end_matches('/')))
}

/// Shortest relative path from `from` to `to`.
///
/// With `directories` set, `from` names a directory rather than a file.
/// Paths with no common ancestor besides the root come back absolute.
///
/// # Errors
/// Returns a resolution error if either path is relative.
pub fn find_shortest_path(from: &str, to: &str, directories: bool) -> Result<String> {
    ensure_absolute(from)?;
    ensure_absolute(to)?;

    let mut from = lcfirst(&normalize_path(from));
    let to = lcfirst(&normalize_path(to));
    if directories {
        from.push_str("/dummy_file");
    }

    if dirname(&from) == dirname(&to) {
        return Ok(format!("./{}", basename(&to)));
    }

    let Some(common) = shared_root(&from, &to) else {
        return Ok(to);
    };

    let depth = from.get(common.len()..).unwrap_or("").matches('/').count();
    let relative = format!("{}{}", "../".repeat(depth), to.get(common.len()..).unwrap_or(""));
    if relative.is_empty() {
        Ok("./".to_string())
    } else {
        Ok(relative)
    }
}

/// Shortest PHP expression for `to`, evaluated from a file in (or at) `from`.
///
/// # Errors
/// Returns a resolution error if either path is relative.
pub fn find_shortest_path_code(from: &str, to: &str, directories: bool) -> Result<PhpExpr> {
    ensure_absolute(from)?;
    ensure_absolute(to)?;

    let from = lcfirst(&normalize_path(from));
    let to = lcfirst(&normalize_path(to));

    if from == to {
        return Ok(if directories {
            PhpExpr::CurrentDir
        } else {
            PhpExpr::CurrentFile
        });
    }

    let Some(common) = shared_root(&from, &to) else {
        return Ok(PhpExpr::str(to));
    };

    if let Some(rest) = to.strip_prefix(&format!("{from}/")) {
        return Ok(PhpExpr::concat([
            PhpExpr::CurrentDir,
            PhpExpr::str(format!("/{rest}")),
        ]));
    }

    let depth = from.get(common.len()..).unwrap_or("").matches('/').count() + usize::from(directories);
    let mut base = PhpExpr::CurrentDir;
    for _ in 0..depth {
        base = PhpExpr::dirname(base);
    }

    match to.get(common.len()..).unwrap_or("") {
        "" => Ok(base),
        rest => Ok(PhpExpr::concat([base, PhpExpr::str(format!("/{rest}"))])),
    }
}

/// Canonical absolute form of an existing path, with `/` separators.
///
/// # Errors
/// Returns a resolution error if the path does not exist.
pub fn real_path(path: &Path) -> Result<String> {
    let canonical = std::fs::canonicalize(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::path_not_found(path.display().to_string())
        } else {
            Error::io(path, e)
        }
    })?;
    let display = canonical.to_string_lossy();
    let display = display.strip_prefix(r"\\?\").unwrap_or(&display);
    Ok(display.replace('\\', "/"))
}

/// Both forms of a path from one location to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    /// Relative path string, or the absolute target if nothing is shared.
    pub relative: String,
    /// PHP expression evaluating to the target at runtime.
    pub code: PhpExpr,
}

/// Resolve a path between two existing locations.
///
/// # Errors
/// Returns a resolution error if either location does not exist.
pub fn resolve(from_dir: &Path, to: &Path) -> Result<PathExpression> {
    let from = real_path(from_dir)?;
    let to = real_path(to)?;
    Ok(PathExpression {
        relative: find_shortest_path(&from, &to, true)?,
        code: find_shortest_path_code(&from, &to, true)?,
    })
}

/// The fixed code expressions every generated file is anchored on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchors {
    /// `$vendorDir`, evaluated inside the output directory.
    pub vendor_dir: PhpExpr,
    /// `$baseDir`, in terms of `$vendorDir`.
    pub base_dir: PhpExpr,
    /// The output directory, evaluated inside the vendor directory.
    pub output_dir_from_vendor: PhpExpr,
    /// The base directory, evaluated inside the output directory.
    pub base_dir_from_output: PhpExpr,
}

/// Turns absolute paths into code relative to the symbolic roots.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: String,
    vendor: String,
    output: String,
}

impl PathResolver {
    /// Create a resolver for existing base, vendor and output directories.
    ///
    /// # Errors
    /// Returns a resolution error if any directory does not exist.
    pub fn new(base_dir: &Path, vendor_dir: &Path, output_dir: &Path) -> Result<Self> {
        Ok(Self {
            base: real_path(base_dir)?,
            vendor: real_path(vendor_dir)?,
            output: real_path(output_dir)?,
        })
    }

    /// Create a resolver from already canonical paths without touching disk.
    ///
    /// # Errors
    /// Returns a resolution error if any path is relative.
    pub fn from_canonical(base: &str, vendor: &str, output: &str) -> Result<Self> {
        for path in [base, vendor, output] {
            ensure_absolute(path)?;
        }
        Ok(Self {
            base: normalize_path(base),
            vendor: normalize_path(vendor),
            output: normalize_path(output),
        })
    }

    /// Canonical base directory.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base
    }

    /// Canonical vendor directory.
    #[must_use]
    pub fn vendor_path(&self) -> &str {
        &self.vendor
    }

    /// Canonical output directory.
    #[must_use]
    pub fn output_path(&self) -> &str {
        &self.output
    }

    /// Compute the anchor expressions.
    ///
    /// # Errors
    /// Propagates resolution errors.
    pub fn anchors(&self) -> Result<Anchors> {
        let base_from_vendor = find_shortest_path_code(&self.vendor, &self.base, true)?;
        Ok(Anchors {
            vendor_dir: find_shortest_path_code(&self.output, &self.vendor, true)?,
            base_dir: base_from_vendor.replace_current_dir(&PhpExpr::Var(Variable::VendorDir)),
            output_dir_from_vendor: find_shortest_path_code(&self.vendor, &self.output, true)?,
            base_dir_from_output: find_shortest_path_code(&self.output, &self.base, true)?,
        })
    }

    /// Code for an absolute path, relative to `$vendorDir` or `$baseDir`.
    ///
    /// Paths outside both roots stay absolute literals. Phar archives get
    /// the `phar://` stream prefix.
    ///
    /// # Errors
    /// Returns a resolution error if the path is relative.
    pub fn path_code(&self, path: &str) -> Result<PhpExpr> {
        ensure_absolute(path)?;
        let path = normalize_path(path);

        let code = if let Some(rest) = under(&path, &self.vendor) {
            root_relative(Variable::VendorDir, rest)
        } else {
            let relative = normalize_path(&find_shortest_path(&self.base, &path, true)?);
            if is_absolute_path(&relative) {
                PhpExpr::str(relative)
            } else {
                root_relative(Variable::BaseDir, &relative)
            }
        };

        if path.ends_with(".phar") {
            Ok(PhpExpr::concat([PhpExpr::str("phar://"), code]))
        } else {
            Ok(code)
        }
    }
}

/// Remainder of `path` below `root`, `""` when equal.
fn under<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    if path == root {
        return Some("");
    }
    path.strip_prefix(root)?.strip_prefix('/')
}

fn root_relative(root: Variable, rest: &str) -> PhpExpr {
    if rest.is_empty() {
        PhpExpr::Var(root)
    } else {
        PhpExpr::concat([PhpExpr::Var(root), PhpExpr::str(format!("/{rest}"))])
    }
}
