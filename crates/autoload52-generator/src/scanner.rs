//! PHP class declaration scanner.
//!
//! Uses regex instead of a full parser, the same trade-off Composer's
//! classmap generator makes:
//! 1. Quick check if the file contains class/interface/trait keywords
//! 2. Strip comments and strings to avoid false positives
//! 3. Extract namespace + class declarations in order

use crate::paths::real_path;
use autoload52_core::{Error, Result};
use memchr::memmem;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

/// Regex for quick keyword check (compiled once)
static QUICK_CHECK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(class|interface|trait)\s").unwrap());

/// Namespace statements and class-like declarations.
static CLASS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)
        (?:
            \b(?P<ns>namespace)\s+
            (?P<nsname>[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}\\]*)\s*[;\{]
            |
            \b(?P<type>class|interface|trait)\s+
            (?P<name>[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*)
        )",
    )
    .unwrap()
});

/// Restricts which files of a namespace directory are scanned.
///
/// A file qualifies when its real path starts with `<dir>/<namespace path>`
/// and has at least one more character, and it is not a `*Test.php` file
/// (a file named exactly `Test.php` is fine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    prefix: String,
}

impl ScanFilter {
    /// Filter for a namespace rule's directory.
    ///
    /// PEAR-style prefixes (containing `_`) do not map to a directory, so
    /// only the directory itself is required.
    #[must_use]
    pub fn for_namespace(dir: &str, namespace: &str) -> Self {
        let namespace_path = if namespace.contains('_') {
            String::new()
        } else {
            namespace.replace('\\', "/")
        };
        Self {
            prefix: format!("{}/{namespace_path}", dir.trim_end_matches('/')),
        }
    }

    /// Check a real file path against the filter.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(&self.prefix) else {
            return false;
        };
        !rest.is_empty() && !is_test_file(path)
    }
}

fn is_test_file(path: &str) -> bool {
    path.ends_with("Test.php") && !path.ends_with("/Test.php") && path != "Test.php"
}

/// Finds class declarations below a path.
///
/// Implementations return `(class name, real path)` pairs. A missing path
/// yields no pairs; an existing but unreadable file is an error.
pub trait ClassScanner {
    /// Scan a file or directory.
    ///
    /// # Errors
    /// Returns a scan error if an existing file cannot be read.
    fn scan(&self, path: &Path, filter: Option<&ScanFilter>) -> Result<Vec<(String, String)>>;
}

impl<T: ClassScanner + ?Sized> ClassScanner for &T {
    fn scan(&self, path: &Path, filter: Option<&ScanFilter>) -> Result<Vec<(String, String)>> {
        (**self).scan(path, filter)
    }
}

/// Regex based scanner over `.php` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastScanner;

impl FastScanner {
    /// Find all classes in PHP source, in declaration order.
    #[must_use]
    pub fn find_classes(content: &str) -> Vec<String> {
        if !QUICK_CHECK.is_match(content) {
            return Vec::new();
        }

        let cleaned = Self::strip_comments_and_strings(content);

        let mut classes = Vec::new();
        let mut namespace = String::new();

        for caps in CLASS_REGEX.captures_iter(&cleaned) {
            if caps.name("ns").is_some() {
                if let Some(nsname) = caps.name("nsname") {
                    namespace = nsname.as_str().to_string();
                    if !namespace.ends_with('\\') {
                        namespace.push('\\');
                    }
                }
            } else if let Some(name) = caps.name("name") {
                let name = name.as_str();

                // anonymous class edge cases
                if name.eq_ignore_ascii_case("extends") || name.eq_ignore_ascii_case("implements")
                {
                    continue;
                }
                // Foo::class
                let before = cleaned[..caps.get(0).map_or(0, |m| m.start())].trim_end();
                if before.ends_with("::") {
                    continue;
                }

                classes.push(format!("{namespace}{name}"));
            }
        }

        classes
    }

    /// Replace comments and string literals with blanks, keeping newlines.
    fn strip_comments_and_strings(content: &str) -> String {
        let bytes = content.as_bytes();
        let len = bytes.len();
        let mut result: Vec<u8> = Vec::with_capacity(len);
        let mut i = 0;

        while i < len {
            let c = bytes[i];

            // Single-line comment: // or #, including `#[` which PHP 5.2
            // reads as a comment rather than an attribute
            if (c == b'/' && bytes.get(i + 1) == Some(&b'/')) || c == b'#' {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }

            // Multi-line comment
            if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
                i += 2;
                while i < len && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    if bytes[i] == b'\n' {
                        result.push(b'\n');
                    }
                    i += 1;
                }
                i += 2;
                continue;
            }

            if c == b'\'' || c == b'"' {
                i += 1;
                while i < len {
                    match bytes[i] {
                        b'\\' => i += 2,
                        q if q == c => {
                            i += 1;
                            break;
                        }
                        b'\n' => {
                            result.push(b'\n');
                            i += 1;
                        }
                        _ => i += 1,
                    }
                }
                result.extend_from_slice(&[c, c]);
                continue;
            }

            // Heredoc/Nowdoc
            if bytes[i..].starts_with(b"<<<") {
                let mut j = i + 3;
                while j < len && matches!(bytes[j], b' ' | b'\t' | b'\'' | b'"') {
                    j += 1;
                }
                let start = j;
                while j < len && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                    j += 1;
                }
                if start == j {
                    result.extend_from_slice(b"<<<");
                    i += 3;
                    continue;
                }
                let mut needle = b"\n".to_vec();
                needle.extend_from_slice(&bytes[start..j]);

                while j < len && bytes[j] != b'\n' {
                    j += 1;
                }
                match memmem::find(&bytes[j..], &needle) {
                    Some(pos) => {
                        let body = &bytes[j..j + pos];
                        result.extend(body.iter().filter(|b| **b == b'\n'));
                        i = j + pos + needle.len();
                    }
                    // unterminated or indented closer, scan the body as code
                    None => i = j,
                }
                continue;
            }

            result.push(c);
            i += 1;
        }

        String::from_utf8_lossy(&result).into_owned()
    }

    /// Files to scan below `root`. A file named directly is scanned
    /// whatever its extension.
    fn php_files(root: &Path) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                Error::scan(path, e.to_string())
            })?;
            if entry.file_type().is_file() && is_php(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Extensions picked up when walking a directory.
const PHP_EXTENSIONS: [&str; 2] = ["php", "inc"];

fn is_php(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PHP_EXTENSIONS.contains(&ext))
}

impl ClassScanner for FastScanner {
    fn scan(&self, path: &Path, filter: Option<&ScanFilter>) -> Result<Vec<(String, String)>> {
        if !path.exists() {
            debug!(path = %path.display(), "scan source does not exist");
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for file in Self::php_files(path)? {
            let real = real_path(&file)?;
            if filter.is_some_and(|f| !f.matches(&real)) {
                continue;
            }

            let content = std::fs::read(&file).map_err(|e| Error::scan(&file, e.to_string()))?;
            for class in Self::find_classes(&String::from_utf8_lossy(&content)) {
                found.push((class, real.clone()));
            }
        }

        debug!(path = %path.display(), classes = found.len(), "scanned");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn simple_class() {
        assert_eq!(FastScanner::find_classes("<?php\nclass Foo {}"), vec!["Foo"]);
    }

    #[test]
    fn namespaced_class() {
        let content = "<?php\nnamespace App\\Models;\nclass User {}";
        assert_eq!(FastScanner::find_classes(content), vec!["App\\Models\\User"]);
    }

    #[test]
    fn multiple_declarations() {
        let content = r"<?php
namespace App;

class Foo {}
interface Bar {}
trait Baz {}
";
        assert_eq!(
            FastScanner::find_classes(content),
            vec!["App\\Foo", "App\\Bar", "App\\Baz"]
        );
    }

    #[test]
    fn pear_style_names() {
        let content = "<?php\nabstract class Zend_Db_Table_Abstract {}\nfinal class Zend_Db {}";
        assert_eq!(
            FastScanner::find_classes(content),
            vec!["Zend_Db_Table_Abstract", "Zend_Db"]
        );
    }

    #[test]
    fn comments_strings_and_heredocs_are_ignored() {
        let content = r#"<?php
// class Fake {}
# class HashFake {}
/* class AlsoFake {} */
$x = "class InString {}";
$y = 'class InSingle {}';
$z = <<<EOT
class InHeredoc {}
EOT;
$w = <<<'NOW'
class InNowdoc {}
NOW;
class Real {}
"#;
        assert_eq!(FastScanner::find_classes(content), vec!["Real"]);
    }

    #[test]
    fn hash_bracket_is_a_line_comment() {
        let content = "<?php\n#[TODO] don't forget\nclass Foo {}\n# [x] done\ninterface Bar {}\n";
        assert_eq!(FastScanner::find_classes(content), vec!["Foo", "Bar"]);
    }

    #[test]
    fn multibyte_names_are_kept_whole() {
        let content = "<?php\nnamespace Café;\nclass Ünïcode_Ωmega {}\n";
        assert_eq!(FastScanner::find_classes(content), vec!["Café\\Ünïcode_Ωmega"]);
    }

    #[test]
    fn class_constant_is_not_a_declaration() {
        let content = "<?php\nclass A {}\n$name = A::class;\n";
        assert_eq!(FastScanner::find_classes(content), vec!["A"]);
    }

    #[test]
    fn no_classes() {
        assert!(FastScanner::find_classes("<?php\necho 'hello';").is_empty());
    }

    #[test]
    fn inc_files_are_scanned_in_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Legacy.inc"), "<?php class Legacy {}").unwrap();
        std::fs::write(dir.path().join("Modern.php"), "<?php class Modern {}").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "class Readme {}").unwrap();

        let found = FastScanner.scan(dir.path(), None).unwrap();
        let classes: Vec<_> = found.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(classes, vec!["Legacy", "Modern"]);
    }

    #[test]
    fn named_file_is_scanned_whatever_its_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bootstrap.php5");
        std::fs::write(&file, "<?php class Bootstrap {}").unwrap();

        let found = FastScanner.scan(&file, None).unwrap();
        assert_eq!(found, vec![("Bootstrap".to_string(), real_path(&file).unwrap())]);
    }

    #[rstest]
    #[case("/p/src", "Acme\\", "/p/src/Acme/Foo.php", true)]
    #[case("/p/src", "Acme\\", "/p/src/Acme/FooTest.php", false)]
    #[case("/p/src", "Acme\\", "/p/src/Acme/Test.php", true)]
    #[case("/p/src", "Acme\\", "/p/src/Other/Foo.php", false)]
    #[case("/p/src", "Acme\\", "/p/src/Acme/", false)]
    #[case("/p/src/", "Acme_", "/p/src/Acme/Foo.php", true)]
    #[case("/p/src", "", "/p/src/Foo.php", true)]
    #[case("/p/src", "Acme", "/p/src/AcmeBundle/Foo.php", true)]
    fn scan_filter(
        #[case] dir: &str,
        #[case] namespace: &str,
        #[case] path: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(ScanFilter::for_namespace(dir, namespace).matches(path), expected);
    }

    #[test]
    fn scans_directory_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("Acme")).unwrap();
        std::fs::write(src.join("Acme/Zeta.php"), "<?php class Acme_Zeta {}").unwrap();
        std::fs::write(src.join("Acme/Alpha.php"), "<?php class Acme_Alpha {}").unwrap();
        std::fs::write(src.join("Acme/AlphaTest.php"), "<?php class Acme_AlphaTest {}").unwrap();
        std::fs::write(src.join("Acme/notes.txt"), "class NotPhp {}").unwrap();

        let found = FastScanner.scan(&src, None).unwrap();
        let classes: Vec<_> = found.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(classes, vec!["Acme_Alpha", "Acme_AlphaTest", "Acme_Zeta"]);

        let real_src = real_path(&src).unwrap();
        let filter = ScanFilter::for_namespace(&real_src, "Acme_");
        let found = FastScanner.scan(&src, Some(&filter)).unwrap();
        let classes: Vec<_> = found.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(classes, vec!["Acme_Alpha", "Acme_Zeta"]);
        assert_eq!(found[0].1, format!("{real_src}/Acme/Alpha.php"));
    }

    #[test]
    fn missing_source_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let found = FastScanner.scan(&dir.path().join("nope"), None).unwrap();
        assert!(found.is_empty());
    }
}
