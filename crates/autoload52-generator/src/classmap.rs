//! Class map construction.

use crate::aggregate::FlattenedAutoload;
use crate::paths::{PathResolver, real_path};
use crate::php::PhpExpr;
use crate::scanner::{ClassScanner, ScanFilter};
use autoload52_core::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Class name to the code expression of its file, sorted by class name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMap {
    entries: BTreeMap<String, PhpExpr>,
}

impl ClassMap {
    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a class.
    #[must_use]
    pub fn get(&self, class: &str) -> Option<&PhpExpr> {
        self.entries.get(class)
    }

    /// Entries in class name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PhpExpr)> {
        self.entries.iter().map(|(class, code)| (class.as_str(), code))
    }
}

/// Builds a [`ClassMap`] from classmap sources and, optionally, namespace
/// directories.
#[derive(Debug)]
pub struct ClassMapBuilder<'a, S: ?Sized> {
    scanner: &'a S,
    resolver: &'a PathResolver,
}

impl<'a, S: ClassScanner + ?Sized> ClassMapBuilder<'a, S> {
    /// Create a builder.
    #[must_use]
    pub const fn new(scanner: &'a S, resolver: &'a PathResolver) -> Self {
        Self { scanner, resolver }
    }

    /// Build the class map.
    ///
    /// Explicit classmap sources are scanned in order and a later source
    /// replaces an earlier one's entry for the same class. Namespace
    /// directories, when enabled, only add classes not already mapped and
    /// are visited most specific prefix first.
    ///
    /// # Errors
    /// Returns a scan error for unreadable files.
    pub fn build(&self, autoload: &FlattenedAutoload, scan_namespace_dirs: bool) -> Result<ClassMap> {
        let mut entries = BTreeMap::new();

        for source in &autoload.classmap {
            for (class, file) in self.scanner.scan(Path::new(source), None)? {
                let code = self.resolver.path_code(&file)?;
                if let Some(previous) = entries.insert(class.clone(), code) {
                    debug!(class = %class, replaced = %previous, file = %file, "class declared twice, later source wins");
                }
            }
        }

        if scan_namespace_dirs {
            for (prefix, dirs) in autoload.namespaces_by_specificity() {
                for dir in dirs {
                    let dir_path = Path::new(dir);
                    if !dir_path.is_dir() {
                        warn!(namespace = %prefix, dir = %dir, "namespace directory does not exist");
                        continue;
                    }

                    let filter = ScanFilter::for_namespace(&real_path(dir_path)?, prefix);
                    for (class, file) in self.scanner.scan(dir_path, Some(&filter))? {
                        if !class.starts_with(prefix) {
                            continue;
                        }
                        if entries.contains_key(&class) {
                            debug!(class = %class, file = %file, "class already mapped, keeping first");
                            continue;
                        }
                        let code = self.resolver.path_code(&file)?;
                        entries.insert(class, code);
                    }
                }
            }
        }

        Ok(ClassMap { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Scanner returning canned results keyed by path.
    struct Canned(Vec<(&'static str, Vec<(&'static str, &'static str)>)>);

    impl ClassScanner for Canned {
        fn scan(&self, path: &Path, filter: Option<&ScanFilter>) -> Result<Vec<(String, String)>> {
            let path = path.to_string_lossy();
            Ok(self
                .0
                .iter()
                .filter(|(p, _)| *p == path)
                .flat_map(|(_, found)| found.iter())
                .filter(|(_, file)| filter.is_none_or(|f| f.matches(file)))
                .map(|(class, file)| ((*class).to_string(), (*file).to_string()))
                .collect())
        }
    }

    fn resolver() -> PathResolver {
        PathResolver::from_canonical("/proj", "/proj/vendor", "/proj/vendor/composer").unwrap()
    }

    #[test]
    fn later_classmap_source_wins() {
        let scanner = Canned(vec![
            ("/proj/vendor/a/lib", vec![("Dup", "/proj/vendor/a/lib/Dup.php")]),
            ("/proj/lib", vec![("Dup", "/proj/lib/Dup.php"), ("Other", "/proj/lib/Other.php")]),
        ]);
        let autoload = FlattenedAutoload {
            classmap: vec!["/proj/vendor/a/lib".into(), "/proj/lib".into()],
            ..FlattenedAutoload::default()
        };

        let resolver = resolver();
        let map = ClassMapBuilder::new(&scanner, &resolver)
            .build(&autoload, false)
            .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Dup").unwrap().render(), "$baseDir . '/lib/Dup.php'");
        let classes: Vec<_> = map.iter().map(|(c, _)| c).collect();
        assert_eq!(classes, vec!["Dup", "Other"]);
    }

    #[test]
    fn missing_sources_are_not_errors() {
        let autoload = FlattenedAutoload {
            classmap: vec!["/proj/nowhere".into()],
            ..FlattenedAutoload::default()
        };
        let resolver = resolver();
        let map = ClassMapBuilder::new(&Canned(Vec::new()), &resolver)
            .build(&autoload, true)
            .unwrap();
        assert!(map.is_empty());
    }
}
