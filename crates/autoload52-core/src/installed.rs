//! Reader for `vendor/composer/installed.json`.
//!
//! This is the adapter between an installer's record of what it put on disk
//! and the generator's [`PackageMap`]. Both the flat array layout and the
//! `{"packages": [...]}` layout are accepted.

use crate::error::{Error, Result};
use crate::package::{AutoloadDeclaration, Package, PackageMap};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
struct InstalledPackage {
    name: String,
    #[serde(default, rename = "target-dir")]
    target_dir: Option<String>,
    #[serde(default)]
    autoload: AutoloadDeclaration,
    #[serde(default, rename = "include-path")]
    include_paths: Vec<String>,
    #[serde(default, rename = "install-path")]
    install_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstalledFile {
    Wrapped { packages: Vec<InstalledPackage> },
    Flat(Vec<InstalledPackage>),
}

/// Packages recorded as installed in a vendor directory.
#[derive(Debug, Clone, Default)]
pub struct InstalledRepository {
    packages: Vec<InstalledPackage>,
}

impl InstalledRepository {
    /// Location of `installed.json` below a vendor directory.
    #[must_use]
    pub fn manifest_path(vendor_dir: &Path) -> PathBuf {
        vendor_dir.join("composer").join("installed.json")
    }

    /// Load the repository for a vendor directory.
    ///
    /// A missing `installed.json` means nothing is installed yet and yields
    /// an empty repository.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(vendor_dir: &Path) -> Result<Self> {
        let path = Self::manifest_path(vendor_dir);
        if !path.exists() {
            debug!(path = %path.display(), "no installed.json, assuming no dependencies");
            return Ok(Self::default());
        }
        let bytes = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
        Self::from_slice(&bytes).map_err(|e| match e {
            Error::Json(inner) => Error::invalid_manifest(inner.to_string(), Some(path.clone())),
            other => other,
        })
    }

    /// Parse repository JSON.
    ///
    /// # Errors
    /// Returns error if the JSON does not describe a package list.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let file: InstalledFile = crate::from_json_slice(bytes)?;
        let packages = match file {
            InstalledFile::Wrapped { packages } | InstalledFile::Flat(packages) => packages,
        };
        Ok(Self { packages })
    }

    /// Number of installed packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if nothing is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Build a package map from the root package and an installed repository.
///
/// Install paths come from `install-path` (relative to `vendor/composer`)
/// when recorded, otherwise `vendor/<name>` plus the package's target dir.
#[must_use]
pub fn build_package_map(
    root: Package,
    repository: &InstalledRepository,
    vendor_dir: &Path,
) -> PackageMap {
    let mut map = PackageMap::new(root);

    for installed in &repository.packages {
        if map.contains(&installed.name) {
            warn!(package = %installed.name, "package listed twice in installed.json, keeping the first entry");
            continue;
        }

        let package = Package {
            name: installed.name.clone(),
            target_dir: installed.target_dir.clone(),
            autoload: installed.autoload.clone(),
            include_paths: installed.include_paths.clone(),
        };

        let install_path = match &installed.install_path {
            Some(rel) => lexical_normalize(&vendor_dir.join("composer").join(rel)),
            None => {
                let mut path = vendor_dir.join(&installed.name);
                if let Some(target_dir) = package.normalized_target_dir() {
                    path.push(target_dir);
                }
                path
            }
        };

        debug!(package = %package.name, path = %install_path.display(), "installed package");
        map.push(package, install_path);
    }

    map
}

/// Resolve `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_flat_layout_with_target_dir() {
        let repo = InstalledRepository::from_slice(
            br#"[
                {"name": "acme/lib", "autoload": {"psr-0": {"Acme\\": "src"}}},
                {"name": "symfony/yaml", "target-dir": "Symfony/Component/Yaml",
                 "autoload": {"psr-0": {"Symfony\\Component\\Yaml": ""}}}
            ]"#,
        )
        .unwrap();
        assert_eq!(repo.len(), 2);

        let map = build_package_map(Package::new("root"), &repo, Path::new("/proj/vendor"));
        let paths: Vec<_> = map
            .dependencies()
            .iter()
            .map(|e| e.install_path.clone())
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/proj/vendor/acme/lib"),
                PathBuf::from("/proj/vendor/symfony/yaml/Symfony/Component/Yaml"),
            ]
        );
    }

    #[test]
    fn reads_wrapped_layout_with_install_path() {
        let repo = InstalledRepository::from_slice(
            br#"{"packages": [
                {"name": "acme/lib", "install-path": "../acme/lib"},
                {"name": "local/pkg", "install-path": "../../packages/pkg"}
            ], "dev": true}"#,
        )
        .unwrap();

        let map = build_package_map(Package::new("root"), &repo, Path::new("/proj/vendor"));
        assert_eq!(
            map.dependencies()[0].install_path,
            PathBuf::from("/proj/vendor/acme/lib")
        );
        assert_eq!(
            map.dependencies()[1].install_path,
            PathBuf::from("/proj/packages/pkg")
        );
    }

    #[test]
    fn duplicate_entries_keep_first() {
        let repo = InstalledRepository::from_slice(
            br#"[{"name": "a/a", "include-path": ["one"]}, {"name": "a/a", "include-path": ["two"]}]"#,
        )
        .unwrap();
        let map = build_package_map(Package::new("root"), &repo, Path::new("/v"));
        assert_eq!(map.dependencies().len(), 1);
        assert_eq!(map.dependencies()[0].package.include_paths, vec!["one"]);
    }

    #[test]
    fn missing_file_is_empty_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = InstalledRepository::load(dir.path()).unwrap();
        assert!(repo.is_empty());
    }

    #[test]
    fn malformed_file_is_manifest_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("composer")).unwrap();
        std::fs::write(dir.path().join("composer/installed.json"), "{\"packages\": 3}").unwrap();

        let err = InstalledRepository::load(dir.path()).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::E0601);
    }
}
