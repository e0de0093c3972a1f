//! Flattening of per-package autoload declarations.
//!
//! Relative paths in a declaration are anchored at the owning package's
//! install path; the root package is anchored at the project base dir.

use crate::paths::{is_absolute_path, normalize_path, real_path};
use autoload52_core::{Package, PackageMap};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Autoload rules of every package merged into one set.
///
/// All paths are absolute and normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedAutoload {
    /// Prefix to directories; root package directories come first.
    pub namespaces: BTreeMap<String, Vec<String>>,
    /// Files to require, dependencies first and root last.
    pub files: Vec<String>,
    /// Classmap sources, dependencies first and root last.
    pub classmap: Vec<String>,
}

impl FlattenedAutoload {
    /// Namespace rules, most specific prefix first.
    pub fn namespaces_by_specificity(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.namespaces
            .iter()
            .rev()
            .map(|(prefix, dirs)| (prefix.as_str(), dirs.as_slice()))
    }

    /// Check if nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.files.is_empty() && self.classmap.is_empty()
    }
}

/// A package paired with the directory its declarations are relative to.
struct Anchored<'a> {
    package: &'a Package,
    install_path: String,
}

fn anchor(path: &Path) -> String {
    real_path(path).unwrap_or_else(|_| normalize_path(&path.to_string_lossy()))
}

/// Root package at `base_dir`, followed by every dependency.
fn anchored<'a>(map: &'a PackageMap, base_dir: &str) -> Vec<Anchored<'a>> {
    let mut out = Vec::with_capacity(map.len());
    out.push(Anchored {
        package: map.root(),
        install_path: base_dir.to_string(),
    });
    out.extend(map.dependencies().iter().map(|entry| Anchored {
        package: &entry.package,
        install_path: anchor(&entry.install_path),
    }));
    out
}

fn join(install_path: &str, relative: &str) -> String {
    if is_absolute_path(relative) {
        normalize_path(relative)
    } else {
        normalize_path(&format!("{install_path}/{relative}"))
    }
}

/// Merge the declarations of every package in `map`.
#[must_use]
pub fn aggregate(map: &PackageMap, base_dir: &str) -> FlattenedAutoload {
    let packages = anchored(map, base_dir);
    let mut flattened = FlattenedAutoload::default();

    for anchored in &packages {
        for (prefix, dirs) in &anchored.package.autoload.namespaces {
            flattened
                .namespaces
                .entry(prefix.clone())
                .or_default()
                .extend(dirs.iter().map(|d| join(&anchored.install_path, d)));
        }
    }

    // root goes last so it can override classes and use dependency functions
    let (root, dependencies) = packages.split_at(1);
    for anchored in dependencies.iter().chain(root) {
        let autoload = &anchored.package.autoload;
        flattened
            .files
            .extend(autoload.files.iter().map(|f| join(&anchored.install_path, f)));
        flattened
            .classmap
            .extend(autoload.classmap.iter().map(|c| join(&anchored.install_path, c)));

        debug!(
            package = anchored.package.display_name(),
            path = %anchored.install_path,
            namespaces = autoload.namespaces.len(),
            files = autoload.files.len(),
            classmap = autoload.classmap.len(),
            "aggregated package"
        );
    }

    flattened
}

/// Include paths of every package, root first so its entries take
/// precedence at runtime.
///
/// A dependency installed below its own target dir contributes paths
/// relative to the directory above it.
#[must_use]
pub fn include_paths(map: &PackageMap, base_dir: &str) -> Vec<String> {
    let mut paths = Vec::new();

    for entry in &anchored(map, base_dir) {
        let package = entry.package;
        if package.include_paths.is_empty() {
            continue;
        }

        let mut install_path = entry.install_path.as_str();
        if !std::ptr::eq(package, map.root()) {
            if let Some(target_dir) = package.normalized_target_dir() {
                if let Some(stripped) = install_path.strip_suffix(&format!("/{target_dir}")) {
                    install_path = stripped;
                }
            }
        }

        paths.extend(
            package
                .include_paths
                .iter()
                .map(|p| join(install_path, p.trim_matches('/'))),
        );
    }

    paths
}
