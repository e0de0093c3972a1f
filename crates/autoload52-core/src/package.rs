//! Package metadata consumed by the generator.
//!
//! These types mirror the parts of a `composer.json` package definition the
//! autoloader cares about. They are read-only input: the generator never
//! mutates a package, it only flattens the declarations of many packages.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name given to a root package whose manifest has no `name`.
pub const ROOT_PACKAGE_NAME: &str = "__root__";

/// Namespace directories can be either a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamespaceDirs {
    /// `"Acme\\": "src"`
    Single(String),
    /// `"Acme\\": ["src", "lib"]`
    Multiple(Vec<String>),
}

impl NamespaceDirs {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s],
            Self::Multiple(v) => v,
        }
    }
}

fn namespace_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, NamespaceDirs>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(prefix, dirs)| (prefix, dirs.into_vec()))
        .collect())
}

/// Autoload rules declared by one package.
///
/// Prefixes are unique within a declaration but may repeat across packages.
/// The empty prefix is the fallback that matches every class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoloadDeclaration {
    /// Namespace prefix to directories, relative to the package install path.
    #[serde(default, rename = "psr-0", deserialize_with = "namespace_map")]
    pub namespaces: BTreeMap<String, Vec<String>>,
    /// Files required unconditionally on every request.
    #[serde(default)]
    pub files: Vec<String>,
    /// Directories or files scanned for class declarations.
    #[serde(default)]
    pub classmap: Vec<String>,
}

impl AutoloadDeclaration {
    /// Check if the declaration has no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.files.is_empty() && self.classmap.is_empty()
    }

    /// Add directories for a namespace prefix.
    pub fn add_namespace(
        &mut self,
        prefix: impl Into<String>,
        dirs: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.namespaces
            .entry(prefix.into())
            .or_default()
            .extend(dirs.into_iter().map(Into::into));
        self
    }
}

/// A package as seen by the autoload generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package name (`vendor/name`).
    #[serde(default)]
    pub name: String,
    /// Legacy target directory the package's namespace root is nested under.
    #[serde(default, rename = "target-dir")]
    pub target_dir: Option<String>,
    /// Declared autoload rules.
    #[serde(default)]
    pub autoload: AutoloadDeclaration,
    /// Paths prepended to the runtime include path.
    #[serde(default, rename = "include-path")]
    pub include_paths: Vec<String>,
}

impl Package {
    /// Create a package with the given name and no autoload rules.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the autoload declaration.
    #[must_use]
    pub fn with_autoload(mut self, autoload: AutoloadDeclaration) -> Self {
        self.autoload = autoload;
        self
    }

    /// Set the legacy target directory.
    #[must_use]
    pub fn with_target_dir(mut self, target_dir: impl Into<String>) -> Self {
        self.target_dir = Some(target_dir.into());
        self
    }

    /// Set the include paths.
    #[must_use]
    pub fn with_include_paths(
        mut self,
        paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.include_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Target directory with surrounding separators removed, if non-empty.
    #[must_use]
    pub fn normalized_target_dir(&self) -> Option<String> {
        self.target_dir
            .as_deref()
            .map(|t| t.replace('\\', "/").trim_matches('/').to_string())
            .filter(|t| !t.is_empty())
    }

    /// Display name, falling back to the root placeholder.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            ROOT_PACKAGE_NAME
        } else {
            &self.name
        }
    }
}

/// One dependency and the absolute path it is installed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMapEntry {
    /// The package.
    pub package: Package,
    /// Absolute install path, as supplied by the resolver.
    pub install_path: PathBuf,
}

/// The root package plus its installed dependencies, in resolver order.
///
/// The root package has no install path of its own; the generator anchors it
/// at the project base directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMap {
    root: Package,
    dependencies: Vec<PackageMapEntry>,
}

impl PackageMap {
    /// Create a package map for the given root package.
    #[must_use]
    pub fn new(root: Package) -> Self {
        Self {
            root,
            dependencies: Vec::new(),
        }
    }

    /// Append a dependency.
    pub fn push(&mut self, package: Package, install_path: impl Into<PathBuf>) {
        self.dependencies.push(PackageMapEntry {
            package,
            install_path: install_path.into(),
        });
    }

    /// Append a dependency, builder style.
    #[must_use]
    pub fn with_dependency(mut self, package: Package, install_path: impl AsRef<Path>) -> Self {
        self.push(package, install_path.as_ref());
        self
    }

    /// The root package.
    #[must_use]
    pub const fn root(&self) -> &Package {
        &self.root
    }

    /// Installed dependencies in resolver order.
    #[must_use]
    pub fn dependencies(&self) -> &[PackageMapEntry] {
        &self.dependencies
    }

    /// Check if a dependency with this name is already present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.iter().any(|e| e.package.name == name)
    }

    /// Number of packages including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len() + 1
    }

    /// A package map always holds the root package.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}
