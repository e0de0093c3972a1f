//! Dump-autoload command implementation.

use crate::commands::OutputFormat;
use crate::output;
use anyhow::Result;
use autoload52_core::{
    EnvVar, GeneratorConfig, InstalledRepository, RootManifest, build_package_map,
};
use autoload52_generator::{AutoloadGenerator, GenerationReport};
use clap::Args;
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Arguments for the dump-autoload command.
#[derive(Args, Debug, Clone)]
pub struct DumpAutoloadArgs {
    /// Also scan namespace directories into the class map
    #[arg(short, long)]
    pub optimize: bool,

    /// Fixed suffix for the generated class names instead of a random one
    #[arg(long, value_name = "SUFFIX")]
    pub suffix: Option<String>,

    /// Vendor directory, relative to the working directory
    #[arg(long, value_name = "DIR")]
    pub vendor_dir: Option<PathBuf>,

    /// Output directory below the vendor directory
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<String>,
}

impl DumpAutoloadArgs {
    /// Apply flags on top of manifest and environment settings.
    fn apply(&self, config: &mut GeneratorConfig) {
        if let Some(vendor_dir) = &self.vendor_dir {
            config.vendor_dir.clone_from(vendor_dir);
        }
        if let Some(target_dir) = &self.target_dir {
            config.target_dir.clone_from(target_dir);
        }
        if let Some(suffix) = &self.suffix {
            config.suffix = Some(suffix.clone());
        }
        config.scan_namespace_dirs |= self.optimize;
    }
}

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    success: bool,
    elapsed_ms: u64,
    report: &'a GenerationReport,
}

/// Run the dump-autoload command.
pub fn run(args: &DumpAutoloadArgs, working_dir: &Path, format: OutputFormat) -> Result<()> {
    info!("running dump-autoload command");
    let start = Instant::now();

    let manifest_path = manifest_path(working_dir, EnvVar::Composer.as_path());
    debug!(path = %manifest_path.display(), "loading root manifest");
    let (root, manifest_config) = RootManifest::load(&manifest_path)?.into_parts();

    let mut config = GeneratorConfig::new(working_dir);
    config.apply_manifest(&manifest_config);
    config.apply_env();
    args.apply(&mut config);

    let vendor_dir = config.vendor_path();
    let installed = InstalledRepository::manifest_path(&vendor_dir);
    if !installed.exists() && format == OutputFormat::Text && !output::is_quiet() {
        output::warning(&format!(
            "{} not found, only the root package will be autoloaded",
            installed.display()
        ));
    }
    let repository = InstalledRepository::load(&vendor_dir)?;
    let package_map = build_package_map(root, &repository, &vendor_dir);
    debug!(
        packages = package_map.dependencies().len(),
        vendor = %vendor_dir.display(),
        "package map built"
    );

    if format == OutputFormat::Text {
        let mode = if config.scan_namespace_dirs {
            format!("{}autoload files", style("optimized ").yellow())
        } else {
            "autoload files".to_string()
        };
        output::header(&format!("Generating PHP 5.2 {mode}"));
    }

    let report = AutoloadGenerator::new(config).dump(&package_map)?;
    let elapsed = start.elapsed();

    match format {
        OutputFormat::Json => {
            let summary = JsonSummary {
                success: true,
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                report: &report,
            };
            println!("{}", autoload52_core::to_json_pretty(&summary)?);
        }
        OutputFormat::Text => print_summary(&report, elapsed),
    }

    Ok(())
}

/// Manifest location: `COMPOSER` if set (relative to the working dir),
/// else `composer.json` in the working dir.
fn manifest_path(working_dir: &Path, from_env: Option<PathBuf>) -> PathBuf {
    match from_env {
        Some(path) if path.is_absolute() => path,
        Some(path) => working_dir.join(path),
        None => working_dir.join("composer.json"),
    }
}

fn print_summary(report: &GenerationReport, elapsed: std::time::Duration) {
    output::success(&format!(
        "Generated autoload files containing {} classes in {}",
        report.classes,
        output::format_duration(elapsed)
    ));
    output::detail("suffix", &report.suffix);
    output::detail("namespaces", report.namespaces);
    output::detail("files", report.files);
    output::detail("include paths", report.include_paths);
    if report.target_dir_hook {
        output::detail("target-dir hook", "yes");
    }
    for path in &report.written {
        debug!(path = %path.display(), "written");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> DumpAutoloadArgs {
        DumpAutoloadArgs {
            optimize: false,
            suffix: None,
            vendor_dir: None,
            target_dir: None,
        }
    }

    #[test]
    fn test_manifest_path_defaults_to_composer_json() {
        assert_eq!(
            manifest_path(Path::new("/srv/app"), None),
            PathBuf::from("/srv/app/composer.json")
        );
    }

    #[test]
    fn test_manifest_path_from_env() {
        assert_eq!(
            manifest_path(Path::new("/srv/app"), Some(PathBuf::from("other.json"))),
            PathBuf::from("/srv/app/other.json")
        );
        assert_eq!(
            manifest_path(Path::new("/srv/app"), Some(PathBuf::from("/etc/app.json"))),
            PathBuf::from("/etc/app.json")
        );
    }

    #[test]
    fn test_flags_override_manifest_values() {
        let mut config = GeneratorConfig::new("/srv/app").with_suffix("FromManifest");
        let args = DumpAutoloadArgs {
            optimize: true,
            suffix: Some("FromFlag".to_string()),
            vendor_dir: Some(PathBuf::from("lib/vendor")),
            target_dir: Some("composer52".to_string()),
        };
        args.apply(&mut config);

        assert_eq!(config.suffix.as_deref(), Some("FromFlag"));
        assert_eq!(config.vendor_path(), PathBuf::from("/srv/app/lib/vendor"));
        assert_eq!(
            config.output_path(),
            PathBuf::from("/srv/app/lib/vendor/composer52")
        );
        assert!(config.scan_namespace_dirs);
    }

    #[test]
    fn test_absent_flags_keep_existing_values() {
        let mut config = GeneratorConfig::new("/srv/app")
            .with_suffix("Kept")
            .with_scan_namespace_dirs(true);
        args().apply(&mut config);

        assert_eq!(config.suffix.as_deref(), Some("Kept"));
        assert_eq!(config.target_dir, GeneratorConfig::DEFAULT_TARGET_DIR);
        assert!(config.scan_namespace_dirs);
    }
}
