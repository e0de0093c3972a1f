//! Generator configuration with layered sources.
//!
//! Values are applied lowest to highest: built-in defaults, the root
//! manifest's `config` section, environment variables, then explicit
//! overrides from the caller (usually CLI flags).

use crate::error::{Error, Result};
use crate::package::{AutoloadDeclaration, Package};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Environment variables understood by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVar {
    /// `COMPOSER_VENDOR_DIR` - vendor directory.
    VendorDir,
    /// COMPOSER - path to composer.json.
    Composer,
}

impl EnvVar {
    /// Get the environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VendorDir => "COMPOSER_VENDOR_DIR",
            Self::Composer => "COMPOSER",
        }
    }

    /// Get the value from environment. Empty values count as unset.
    #[must_use]
    pub fn get(self) -> Option<String> {
        std::env::var(self.as_str()).ok().filter(|v| !v.is_empty())
    }

    /// Get as path.
    #[must_use]
    pub fn as_path(self) -> Option<PathBuf> {
        self.get().map(PathBuf::from)
    }
}

/// The `config` section of the root `composer.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ManifestConfig {
    /// Vendor directory, relative to the project root.
    #[serde(default, rename = "vendor-dir")]
    pub vendor_dir: Option<String>,
    /// Fixed suffix for generated symbol names.
    #[serde(default, rename = "autoloader-suffix")]
    pub autoloader_suffix: Option<String>,
    /// Also scan namespace directories into the classmap.
    #[serde(default, rename = "optimize-autoloader")]
    pub optimize_autoloader: bool,
}

/// The root `composer.json`, reduced to what autoload generation needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootManifest {
    /// Package name.
    #[serde(default)]
    pub name: String,
    /// Legacy target directory.
    #[serde(default, rename = "target-dir")]
    pub target_dir: Option<String>,
    /// Autoload rules.
    #[serde(default)]
    pub autoload: AutoloadDeclaration,
    /// Include paths.
    #[serde(default, rename = "include-path")]
    pub include_paths: Vec<String>,
    /// Configuration section.
    #[serde(default)]
    pub config: ManifestConfig,
}

impl RootManifest {
    /// Load and parse a manifest file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        crate::from_json(&content)
            .map_err(|e| Error::invalid_manifest(e.to_string(), Some(path.to_path_buf())))
    }

    /// Split into the root package and its configuration section.
    #[must_use]
    pub fn into_parts(self) -> (Package, ManifestConfig) {
        let package = Package {
            name: self.name,
            target_dir: self.target_dir,
            autoload: self.autoload,
            include_paths: self.include_paths,
        };
        (package, self.config)
    }
}

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Project base directory; the root package is anchored here.
    pub base_dir: PathBuf,
    /// Vendor directory, absolute or relative to `base_dir`.
    pub vendor_dir: PathBuf,
    /// Output subdirectory name below the vendor directory.
    pub target_dir: String,
    /// Also scan namespace directories for classes.
    pub scan_namespace_dirs: bool,
    /// Fixed symbol suffix; a random one is generated when unset.
    pub suffix: Option<String>,
}

impl GeneratorConfig {
    /// Default vendor directory name.
    pub const DEFAULT_VENDOR_DIR: &'static str = "vendor";
    /// Default output subdirectory name.
    pub const DEFAULT_TARGET_DIR: &'static str = "composer";

    /// Create a configuration with built-in defaults.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            vendor_dir: PathBuf::from(Self::DEFAULT_VENDOR_DIR),
            target_dir: Self::DEFAULT_TARGET_DIR.to_string(),
            scan_namespace_dirs: false,
            suffix: None,
        }
    }

    /// Set the vendor directory.
    #[must_use]
    pub fn with_vendor_dir(mut self, vendor_dir: impl Into<PathBuf>) -> Self {
        self.vendor_dir = vendor_dir.into();
        self
    }

    /// Set the output subdirectory.
    #[must_use]
    pub fn with_target_dir(mut self, target_dir: impl Into<String>) -> Self {
        self.target_dir = target_dir.into();
        self
    }

    /// Enable or disable namespace directory scanning.
    #[must_use]
    pub const fn with_scan_namespace_dirs(mut self, scan: bool) -> Self {
        self.scan_namespace_dirs = scan;
        self
    }

    /// Set a fixed suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Apply the root manifest's `config` section.
    pub fn apply_manifest(&mut self, config: &ManifestConfig) {
        if let Some(vendor_dir) = &config.vendor_dir {
            self.vendor_dir = PathBuf::from(vendor_dir);
        }
        if let Some(suffix) = &config.autoloader_suffix {
            self.suffix = Some(suffix.clone());
        }
        self.scan_namespace_dirs |= config.optimize_autoloader;
    }

    /// Apply environment variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(EnvVar::get);
    }

    /// Apply environment variables using a custom lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(EnvVar) -> Option<String>) {
        if let Some(vendor_dir) = lookup(EnvVar::VendorDir) {
            debug!(vendor_dir = %vendor_dir, "vendor dir overridden from environment");
            self.vendor_dir = PathBuf::from(vendor_dir);
        }
    }

    /// Absolute vendor directory.
    #[must_use]
    pub fn vendor_path(&self) -> PathBuf {
        if self.vendor_dir.is_absolute() {
            self.vendor_dir.clone()
        } else {
            self.base_dir.join(&self.vendor_dir)
        }
    }

    /// Absolute output directory.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.vendor_path().join(&self.target_dir)
    }

    /// Validate the settings that end up embedded in generated code.
    ///
    /// # Errors
    /// Returns a configuration error for an unusable suffix or target dir.
    pub fn validate(&self) -> Result<()> {
        if let Some(suffix) = &self.suffix {
            if !is_valid_suffix(suffix) {
                return Err(Error::config_key(
                    "autoloader-suffix",
                    format!("'{suffix}' must be non-empty and contain only A-Z, a-z, 0-9 or _"),
                ));
            }
        }

        let target = Path::new(&self.target_dir);
        if self.target_dir.is_empty()
            || target.is_absolute()
            || target
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::config_key(
                "target-dir",
                format!(
                    "'{}' must be a relative directory below the vendor dir",
                    self.target_dir
                ),
            ));
        }

        Ok(())
    }
}

fn is_valid_suffix(suffix: &str) -> bool {
    !suffix.is_empty()
        && suffix
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = GeneratorConfig::new("/proj");
        assert_eq!(config.vendor_path(), PathBuf::from("/proj/vendor"));
        assert_eq!(config.output_path(), PathBuf::from("/proj/vendor/composer"));
        assert!(!config.scan_namespace_dirs);
        assert!(config.suffix.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn manifest_then_env_layering() {
        let manifest = ManifestConfig {
            vendor_dir: Some("lib/vendor".into()),
            autoloader_suffix: Some("abc123".into()),
            optimize_autoloader: true,
        };

        let mut config = GeneratorConfig::new("/proj");
        config.apply_manifest(&manifest);
        assert_eq!(config.vendor_path(), PathBuf::from("/proj/lib/vendor"));
        assert_eq!(config.suffix.as_deref(), Some("abc123"));
        assert!(config.scan_namespace_dirs);

        config.apply_env_from(|var| match var {
            EnvVar::VendorDir => Some("/elsewhere/vendor".into()),
            EnvVar::Composer => None,
        });
        assert_eq!(config.vendor_path(), PathBuf::from("/elsewhere/vendor"));
    }

    #[test]
    fn root_manifest_splits_into_package_and_config() {
        let manifest: RootManifest = crate::from_json(
            r#"{
                "name": "acme/app",
                "target-dir": "Acme/App",
                "autoload": {"psr-0": {"Acme\\App": ""}},
                "config": {"vendor-dir": "deps", "autoloader-suffix": "fixed"}
            }"#,
        )
        .unwrap();

        let (package, config) = manifest.into_parts();
        assert_eq!(package.name, "acme/app");
        assert_eq!(package.target_dir.as_deref(), Some("Acme/App"));
        assert_eq!(package.autoload.namespaces["Acme\\App"], vec![""]);
        assert_eq!(config.vendor_dir.as_deref(), Some("deps"));
        assert!(!config.optimize_autoloader);
    }

    #[rstest]
    #[case("deadbeef", true)]
    #[case("with_underscore_9", true)]
    #[case("", false)]
    #[case("has-dash", false)]
    #[case("sp ace", false)]
    fn suffix_validation(#[case] suffix: &str, #[case] valid: bool) {
        let config = GeneratorConfig::new("/proj").with_suffix(suffix);
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[rstest]
    #[case("composer", true)]
    #[case("composer/php52", true)]
    #[case("", false)]
    #[case("../outside", false)]
    #[case("/abs", false)]
    fn target_dir_validation(#[case] target: &str, #[case] valid: bool) {
        let config = GeneratorConfig::new("/proj").with_target_dir(target);
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn load_reports_manifest_path_on_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composer.json");
        std::fs::write(&path, "{").unwrap();

        let err = RootManifest::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidManifest { path: Some(ref p), .. } if p == &path));
    }
}
