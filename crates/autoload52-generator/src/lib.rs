//! PHP 5.2 compatible autoloader generation for autoload52.
//!
//! Produces the same kind of autoloader Composer does, but as code that runs
//! on PHP 5.2: no namespaces in the runtime, no closures, no `__DIR__`.
//!
//! Pipeline:
//! - Flatten every package's autoload declarations ([`aggregate`])
//! - Scan classmap sources, optionally namespace dirs ([`ClassMapBuilder`])
//! - Express every path relative to the generated files ([`PathResolver`])
//! - Render and write the artifacts ([`CodeEmitter`])

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod aggregate;
mod classmap;
mod emit;
mod paths;
mod php;
mod scanner;
mod template;

pub use aggregate::{FlattenedAutoload, aggregate, include_paths};
pub use classmap::{ClassMap, ClassMapBuilder};
pub use emit::{
    Artifacts, BOOTSTRAP_FILE, CLASS_LOADER_FILE, CLASS_LOADER_SOURCE, CLASSMAP_FILE,
    CodeEmitter, INCLUDE_PATHS_FILE, NAMESPACES_FILE, REAL_LOADER_FILE, RealLoaderPlan,
    TargetDirLoader,
};
pub use paths::{
    Anchors, PathExpression, PathResolver, find_shortest_path, find_shortest_path_code,
    is_absolute_path, normalize_path, real_path, resolve,
};
pub use php::{EvalContext, PhpExpr, Variable, export_string};
pub use scanner::{ClassScanner, FastScanner, ScanFilter};

use autoload52_core::{Error, GeneratorConfig, PackageMap, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Generate a random 32 character hex suffix.
#[must_use]
pub fn random_suffix() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// One file to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Destination path.
    pub path: PathBuf,
    /// File contents.
    pub contents: String,
}

impl GeneratedFile {
    /// File name of the destination.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Summary of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Suffix of the generated symbols.
    pub suffix: String,
    /// Number of namespace prefixes.
    pub namespaces: usize,
    /// Number of classes in the class map.
    pub classes: usize,
    /// Number of files required on every request.
    pub files: usize,
    /// Number of include paths.
    pub include_paths: usize,
    /// Whether the target-dir fallback hook was generated.
    pub target_dir_hook: bool,
    /// Written files, in write order.
    pub written: Vec<PathBuf>,
}

/// A fully rendered autoloader that has not been written yet.
#[derive(Debug, Clone)]
pub struct GeneratedAutoloader {
    files: Vec<GeneratedFile>,
    stale: Vec<PathBuf>,
    report: GenerationReport,
}

impl GeneratedAutoloader {
    /// Suffix of the generated symbols.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.report.suffix
    }

    /// Files in write order.
    #[must_use]
    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    /// Look up a file by name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.file_name() == name)
    }

    /// Write every file, then remove artifacts this run no longer produces.
    ///
    /// A failure aborts the run; files written before it stay on disk.
    ///
    /// # Errors
    /// Returns a write error for the first file that cannot be written.
    pub fn write(self) -> Result<GenerationReport> {
        let mut report = self.report;

        for file in &self.files {
            std::fs::write(&file.path, &file.contents).map_err(|e| Error::write(&file.path, e))?;
            debug!(path = %file.path.display(), bytes = file.contents.len(), "wrote");
            report.written.push(file.path.clone());
        }

        for path in &self.stale {
            if path.exists() {
                std::fs::remove_file(path).map_err(|e| Error::write(path, e))?;
                debug!(path = %path.display(), "removed stale artifact");
            }
        }

        Ok(report)
    }
}

/// PHP 5.2 autoloader generator.
#[derive(Debug, Clone)]
pub struct AutoloadGenerator<S = FastScanner> {
    config: GeneratorConfig,
    scanner: S,
}

impl AutoloadGenerator<FastScanner> {
    /// Create a generator using the default class scanner.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_scanner(config, FastScanner)
    }
}

impl<S: ClassScanner> AutoloadGenerator<S> {
    /// Create a generator with a custom class scanner.
    #[must_use]
    pub fn with_scanner(config: GeneratorConfig, scanner: S) -> Self {
        Self { config, scanner }
    }

    /// Generator configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Render every artifact without writing.
    ///
    /// The vendor and output directories are created if missing, since
    /// paths are anchored on their real locations.
    ///
    /// # Errors
    /// Returns configuration, resolution, scan or template errors.
    pub fn generate(&self, package_map: &PackageMap) -> Result<GeneratedAutoloader> {
        self.config.validate()?;

        let vendor_dir = self.config.vendor_path();
        ensure_directory_exists(&vendor_dir).map_err(|e| Error::vendor_dir(&vendor_dir, e))?;
        let output_dir = self.config.output_path();
        ensure_directory_exists(&output_dir).map_err(|e| Error::write(&output_dir, e))?;

        let resolver = PathResolver::new(&self.config.base_dir, &vendor_dir, &output_dir)?;
        debug!(
            base = resolver.base_path(),
            vendor = resolver.vendor_path(),
            output = resolver.output_path(),
            "resolved directories"
        );

        let autoload = aggregate(package_map, resolver.base_path());
        let class_map = ClassMapBuilder::new(&self.scanner, &resolver)
            .build(&autoload, self.config.scan_namespace_dirs)?;
        let include_paths = include_paths(package_map, resolver.base_path());
        let target_dir = TargetDirLoader::for_root(package_map.root());

        let suffix = self.config.suffix.clone().unwrap_or_else(random_suffix);
        let report = GenerationReport {
            suffix: suffix.clone(),
            namespaces: autoload.namespaces.len(),
            classes: class_map.len(),
            files: autoload.files.len(),
            include_paths: include_paths.len(),
            target_dir_hook: target_dir.is_some(),
            written: Vec::new(),
        };

        let artifacts = CodeEmitter::new(&resolver, &suffix)?.emit(
            &autoload,
            &class_map,
            &include_paths,
            target_dir,
        )?;

        let mut files = vec![
            GeneratedFile {
                path: output_dir.join(NAMESPACES_FILE),
                contents: artifacts.namespaces,
            },
            GeneratedFile {
                path: output_dir.join(CLASSMAP_FILE),
                contents: artifacts.classmap,
            },
        ];
        let mut stale = Vec::new();
        match artifacts.include_paths {
            Some(contents) => files.push(GeneratedFile {
                path: output_dir.join(INCLUDE_PATHS_FILE),
                contents,
            }),
            None => stale.push(output_dir.join(INCLUDE_PATHS_FILE)),
        }
        files.extend([
            GeneratedFile {
                path: vendor_dir.join(BOOTSTRAP_FILE),
                contents: artifacts.bootstrap,
            },
            GeneratedFile {
                path: output_dir.join(REAL_LOADER_FILE),
                contents: artifacts.real_loader,
            },
            GeneratedFile {
                path: output_dir.join(CLASS_LOADER_FILE),
                contents: CLASS_LOADER_SOURCE.to_string(),
            },
        ]);

        Ok(GeneratedAutoloader {
            files,
            stale,
            report,
        })
    }

    /// Generate and write the autoloader.
    ///
    /// # Errors
    /// Returns configuration, resolution, scan, template or write errors.
    pub fn dump(&self, package_map: &PackageMap) -> Result<GenerationReport> {
        let report = self.generate(package_map)?.write()?;

        info!(
            suffix = %report.suffix,
            namespaces = report.namespaces,
            classes = report.classes,
            files = report.files,
            include_paths = report.include_paths,
            "autoloader generated"
        );

        Ok(report)
    }
}

fn ensure_directory_exists(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_suffix_is_32_hex_chars() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 32);
        assert!(suffix.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        assert_ne!(suffix, random_suffix());
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new(dir.path()).with_suffix("not-valid");
        let err = AutoloadGenerator::new(config)
            .generate(&PackageMap::default())
            .unwrap_err();

        assert_eq!(err.code(), autoload52_core::ErrorCode::E0102);
        assert!(!dir.path().join("vendor").exists());
    }

    #[test]
    fn vendor_dir_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vendor"), "not a dir").unwrap();

        let err = AutoloadGenerator::new(GeneratorConfig::new(dir.path()))
            .generate(&PackageMap::default())
            .unwrap_err();
        assert_eq!(err.code(), autoload52_core::ErrorCode::E0101);
    }
}
