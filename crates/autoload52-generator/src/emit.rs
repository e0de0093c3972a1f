//! Rendering of the generated PHP artifacts.

use crate::aggregate::FlattenedAutoload;
use crate::classmap::ClassMap;
use crate::paths::{Anchors, PathResolver};
use crate::php::{PhpExpr, Variable};
use crate::template::Template;
use autoload52_core::{Error, Package, Result};

/// Namespace map file, in the output dir.
pub const NAMESPACES_FILE: &str = "autoload_namespaces_52.php";
/// Class map file, in the output dir.
pub const CLASSMAP_FILE: &str = "autoload_classmap_52.php";
/// Include path list, in the output dir.
pub const INCLUDE_PATHS_FILE: &str = "include_paths_52.php";
/// Bootstrap entry point, in the vendor dir.
pub const BOOTSTRAP_FILE: &str = "autoload_52.php";
/// Real loader, in the output dir.
pub const REAL_LOADER_FILE: &str = "autoload_real_52.php";
/// Class loader implementation, in the output dir.
pub const CLASS_LOADER_FILE: &str = "ClassLoader52.php";

/// Class loader implementation shipped with every generated autoloader.
pub const CLASS_LOADER_SOURCE: &str = include_str!("templates/ClassLoader52.php");

const MAP_FILE: Template = Template::new("map_file", include_str!("templates/map_file.php"));
const BOOTSTRAP: Template = Template::new(BOOTSTRAP_FILE, include_str!("templates/autoload_52.php"));
const REAL_LOADER: Template =
    Template::new(REAL_LOADER_FILE, include_str!("templates/autoload_real_52.php"));
const TARGET_DIR_AUTOLOAD: Template = Template::new(
    "target_dir_autoload",
    include_str!("templates/target_dir_autoload.php"),
);

const INCLUDE_PATHS_SETUP: Template = Template::new(
    "include_paths_setup",
    "\t\t$includePaths = require {{file}};
\t\tarray_push($includePaths, get_include_path());
\t\tset_include_path(implode(PATH_SEPARATOR, $includePaths));

",
);

const NAMESPACES_SETUP: Template = Template::new(
    "namespaces_setup",
    "\t\t$map = require {{file}};
\t\tforeach ($map as $namespace => $path) {
\t\t\t$loader->add($namespace, $path);
\t\t}

",
);

const CLASSMAP_SETUP: Template = Template::new(
    "classmap_setup",
    "\t\t$classMap = require {{file}};
\t\tif ($classMap) {
\t\t\t$loader->addClassMap($classMap);
\t\t}

",
);

const TARGET_DIR_SETUP: Template = Template::new(
    "target_dir_setup",
    "\t\tspl_autoload_register(array('ComposerAutoloaderInit{{suffix}}', 'autoload'));

",
);

/// Fallback lookup for a root package that declares a target dir.
///
/// Installed as a dependency, such a package sits below its target dir and
/// the namespace rules find its classes. As the root package it is checked
/// out without that nesting, so the hook drops the target dir's leading
/// segments from the class path and resolves the rest against the base dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDirLoader {
    prefixes: Vec<String>,
    levels: usize,
}

impl TargetDirLoader {
    /// Hook for the root package, if it declares a target dir and namespaces.
    ///
    /// Prefixes are listed in sorted order rather than declaration order.
    /// The hook derives the file path from the class name alone, so any
    /// matching prefix yields the same file.
    #[must_use]
    pub fn for_root(root: &Package) -> Option<Self> {
        let target_dir = root.normalized_target_dir()?;
        if root.autoload.namespaces.is_empty() {
            return None;
        }
        Some(Self {
            prefixes: root.autoload.namespaces.keys().cloned().collect(),
            levels: target_dir.split('/').count(),
        })
    }

    /// Namespace prefixes the hook answers for.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Number of leading path segments stripped from class paths.
    #[must_use]
    pub const fn levels(&self) -> usize {
        self.levels
    }

    fn render(&self, base_dir_from_output: &PhpExpr) -> Result<String> {
        let dir = PhpExpr::concat([base_dir_from_output.clone(), PhpExpr::str("/")]);
        let prefixes = PhpExpr::array(self.prefixes.iter().map(PhpExpr::str));
        TARGET_DIR_AUTOLOAD
            .bind()
            .expr("base_dir", &dir)
            .expr("prefixes", &prefixes)
            .int("levels", self.levels)
            .render()
    }
}

/// What the real loader sets up before registering.
#[derive(Debug, Clone, Default)]
pub struct RealLoaderPlan {
    /// Prepend include paths.
    pub include_paths: bool,
    /// Register namespace rules.
    pub namespaces: bool,
    /// Register the class map.
    pub classmap: bool,
    /// Target-dir fallback hook.
    pub target_dir: Option<TargetDirLoader>,
    /// Files required after registration, absolute.
    pub files: Vec<String>,
}

/// Rendered contents of every artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// `autoload_namespaces_52.php`
    pub namespaces: String,
    /// `autoload_classmap_52.php`
    pub classmap: String,
    /// `include_paths_52.php`, absent when there are no include paths.
    pub include_paths: Option<String>,
    /// `autoload_52.php`
    pub bootstrap: String,
    /// `autoload_real_52.php`
    pub real_loader: String,
}

/// Renders artifacts for one generation run.
#[derive(Debug)]
pub struct CodeEmitter<'a> {
    resolver: &'a PathResolver,
    anchors: Anchors,
    suffix: &'a str,
}

impl<'a> CodeEmitter<'a> {
    /// Create an emitter.
    ///
    /// # Errors
    /// Propagates resolution errors while computing the anchors.
    pub fn new(resolver: &'a PathResolver, suffix: &'a str) -> Result<Self> {
        Ok(Self {
            anchors: resolver.anchors()?,
            resolver,
            suffix,
        })
    }

    /// Anchor expressions in use.
    #[must_use]
    pub const fn anchors(&self) -> &Anchors {
        &self.anchors
    }

    /// Render every artifact.
    ///
    /// The real loader only registers what is non-empty, and the include
    /// path file is left out entirely when there are no include paths.
    ///
    /// # Errors
    /// Returns resolution or template errors.
    pub fn emit(
        &self,
        autoload: &FlattenedAutoload,
        class_map: &ClassMap,
        include_paths: &[String],
        target_dir: Option<TargetDirLoader>,
    ) -> Result<Artifacts> {
        let namespaces = self.namespaces_file(autoload.namespaces_by_specificity())?;
        let classmap = self.classmap_file(class_map)?;
        let include_paths = self.include_paths_file(include_paths)?;

        let plan = RealLoaderPlan {
            include_paths: include_paths.is_some(),
            namespaces: !autoload.namespaces.is_empty(),
            classmap: !class_map.is_empty(),
            target_dir,
            files: autoload.files.clone(),
        };

        Ok(Artifacts {
            namespaces,
            classmap,
            include_paths,
            bootstrap: self.bootstrap_file()?,
            real_loader: self.real_loader_file(&plan)?,
        })
    }

    fn map_file(&self, file_name: &str, entries: &str) -> Result<String> {
        MAP_FILE
            .bind()
            .code("file_name", file_name)
            .expr("vendor_dir", &self.anchors.vendor_dir)
            .expr("base_dir", &self.anchors.base_dir)
            .code("entries", entries)
            .render()
    }

    /// Namespace map file. Prefixes must already be in emission order.
    ///
    /// # Errors
    /// Returns resolution or template errors.
    pub fn namespaces_file<'n>(
        &self,
        namespaces: impl IntoIterator<Item = (&'n str, &'n [String])>,
    ) -> Result<String> {
        let mut entries = String::new();
        for (prefix, dirs) in namespaces {
            let mut codes = dirs
                .iter()
                .map(|d| self.resolver.path_code(d))
                .collect::<Result<Vec<_>>>()?;
            let value = if codes.len() == 1 {
                codes.remove(0)
            } else {
                PhpExpr::array(codes)
            };
            entries.push_str(&entry(NAMESPACES_FILE, &PhpExpr::str(prefix), &value)?);
        }
        self.map_file(NAMESPACES_FILE, &entries)
    }

    /// Class map file.
    ///
    /// # Errors
    /// Returns template errors.
    pub fn classmap_file(&self, class_map: &ClassMap) -> Result<String> {
        let mut entries = String::new();
        for (class, code) in class_map.iter() {
            entries.push_str(&entry(CLASSMAP_FILE, &PhpExpr::str(class), code)?);
        }
        self.map_file(CLASSMAP_FILE, &entries)
    }

    /// Include path file, `None` when there is nothing to include.
    ///
    /// # Errors
    /// Returns resolution or template errors.
    pub fn include_paths_file(&self, paths: &[String]) -> Result<Option<String>> {
        if paths.is_empty() {
            return Ok(None);
        }
        let mut entries = String::new();
        for path in paths {
            let code = self.resolver.path_code(path)?;
            entries.push_str(&format!("\t{},\n", render_checked(INCLUDE_PATHS_FILE, &code)?));
        }
        self.map_file(INCLUDE_PATHS_FILE, &entries).map(Some)
    }

    /// Bootstrap entry point in the vendor dir.
    ///
    /// # Errors
    /// Returns template errors.
    pub fn bootstrap_file(&self) -> Result<String> {
        let real_loader = PhpExpr::concat([
            self.anchors.output_dir_from_vendor.clone(),
            PhpExpr::str(format!("/{REAL_LOADER_FILE}")),
        ]);
        BOOTSTRAP
            .bind()
            .expr("real_loader", &real_loader)
            .ident("suffix", self.suffix)
            .render()
    }

    /// Real loader with singleton initialization and registration.
    ///
    /// # Errors
    /// Returns resolution or template errors.
    pub fn real_loader_file(&self, plan: &RealLoaderPlan) -> Result<String> {
        let in_output_dir =
            |file: &str| PhpExpr::concat([PhpExpr::Var(Variable::Dir), PhpExpr::str(format!("/{file}"))]);

        let mut setup = String::new();
        if plan.include_paths {
            setup.push_str(
                &INCLUDE_PATHS_SETUP
                    .bind()
                    .expr("file", &in_output_dir(INCLUDE_PATHS_FILE))
                    .render()?,
            );
        }
        if plan.namespaces {
            setup.push_str(
                &NAMESPACES_SETUP
                    .bind()
                    .expr("file", &in_output_dir(NAMESPACES_FILE))
                    .render()?,
            );
        }
        if plan.classmap {
            setup.push_str(
                &CLASSMAP_SETUP
                    .bind()
                    .expr("file", &in_output_dir(CLASSMAP_FILE))
                    .render()?,
            );
        }
        if plan.target_dir.is_some() {
            setup.push_str(&TARGET_DIR_SETUP.bind().ident("suffix", self.suffix).render()?);
        }

        let mut requires = String::new();
        if !plan.files.is_empty() {
            requires.push('\n');
            for file in &plan.files {
                let code = self.resolver.path_code(file)?;
                requires.push_str(&format!(
                    "\t\trequire {};\n",
                    render_checked(REAL_LOADER_FILE, &code)?
                ));
            }
        }

        let fallback = match &plan.target_dir {
            Some(loader) => loader.render(&self.anchors.base_dir_from_output)?,
            None => String::new(),
        };

        let class_loader = PhpExpr::concat([
            PhpExpr::CurrentDir,
            PhpExpr::str(format!("/{CLASS_LOADER_FILE}")),
        ]);

        REAL_LOADER
            .bind()
            .ident("suffix", self.suffix)
            .expr("class_loader", &class_loader)
            .expr("vendor_dir", &self.anchors.vendor_dir)
            .expr("base_dir", &self.anchors.base_dir)
            .code("setup", setup)
            .code("requires", requires)
            .code("fallback", fallback)
            .render()
    }
}

/// Render an expression placed outside a template slot.
fn render_checked(file: &str, expr: &PhpExpr) -> Result<String> {
    match expr.find_unrenderable() {
        Some(bad) => Err(Error::unrenderable(
            file,
            format!("'{}' contains a NUL byte", bad.escape_debug()),
        )),
        None => Ok(expr.render()),
    }
}

fn entry(file: &str, key: &PhpExpr, value: &PhpExpr) -> Result<String> {
    Ok(format!(
        "\t{} => {},\n",
        render_checked(file, key)?,
        render_checked(file, value)?
    ))
}
