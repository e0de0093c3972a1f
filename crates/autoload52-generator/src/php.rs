//! Structured PHP expressions for generated code.
//!
//! Generated files only ever embed a handful of expression shapes: string
//! literals, the `$vendorDir`/`$baseDir`/`$dir` locals, the current file or
//! directory, `dirname()` and concatenation. Building them as values instead
//! of strings keeps quoting in one place and lets tests evaluate them.

use crate::paths::dirname;
use std::collections::BTreeMap;
use std::fmt;

/// Locals assigned at the top of generated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    /// `$vendorDir`
    VendorDir,
    /// `$baseDir`
    BaseDir,
    /// `$dir`, the output directory inside the real loader.
    Dir,
}

impl Variable {
    /// Variable name without the `$`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::VendorDir => "vendorDir",
            Self::BaseDir => "baseDir",
            Self::Dir => "dir",
        }
    }
}

/// A PHP expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhpExpr {
    /// Single-quoted string literal.
    Str(String),
    /// A local variable.
    Var(Variable),
    /// Directory of the file the expression is evaluated in.
    ///
    /// Rendered as `dirname(__FILE__)`; PHP 5.2 has no `__DIR__`.
    CurrentDir,
    /// `__FILE__`
    CurrentFile,
    /// `dirname(inner)`
    Dirname(Box<PhpExpr>),
    /// Concatenation with `.`
    Concat(Vec<PhpExpr>),
    /// `array(a, b, ...)`
    Array(Vec<PhpExpr>),
}

impl PhpExpr {
    /// String literal.
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Wrap in `dirname()`.
    #[must_use]
    pub fn dirname(inner: Self) -> Self {
        Self::Dirname(Box::new(inner))
    }

    /// Concatenate, flattening nested concatenations and merging adjacent
    /// literals.
    pub fn concat(parts: impl IntoIterator<Item = Self>) -> Self {
        let mut flat: Vec<Self> = Vec::new();
        for part in parts {
            let nested = match part {
                Self::Concat(inner) => inner,
                other => vec![other],
            };
            for item in nested {
                if let Self::Str(next) = &item {
                    if let Some(Self::Str(prev)) = flat.last_mut() {
                        prev.push_str(next);
                        continue;
                    }
                }
                flat.push(item);
            }
        }
        match flat.len() {
            0 => Self::Str(String::new()),
            1 => flat.remove(0),
            _ => Self::Concat(flat),
        }
    }

    /// `array(...)` literal.
    pub fn array(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// Substitute every current-directory token.
    #[must_use]
    pub fn replace_current_dir(&self, with: &Self) -> Self {
        match self {
            Self::CurrentDir => with.clone(),
            Self::Dirname(inner) => Self::dirname(inner.replace_current_dir(with)),
            Self::Concat(parts) => Self::concat(parts.iter().map(|p| p.replace_current_dir(with))),
            Self::Array(items) => Self::array(items.iter().map(|i| i.replace_current_dir(with))),
            other => other.clone(),
        }
    }

    /// Find a literal that cannot be embedded in a PHP source file.
    #[must_use]
    pub fn find_unrenderable(&self) -> Option<&str> {
        match self {
            Self::Str(s) if s.contains('\0') => Some(s.as_str()),
            Self::Dirname(inner) => inner.find_unrenderable(),
            Self::Concat(parts) | Self::Array(parts) => {
                parts.iter().find_map(Self::find_unrenderable)
            }
            _ => None,
        }
    }

    /// Render as PHP source.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Self::Str(s) => out.push_str(&export_string(s)),
            Self::Var(var) => {
                out.push('$');
                out.push_str(var.name());
            }
            Self::CurrentDir => out.push_str("dirname(__FILE__)"),
            Self::CurrentFile => out.push_str("__FILE__"),
            Self::Dirname(inner) => {
                out.push_str("dirname(");
                inner.render_into(out);
                out.push(')');
            }
            Self::Concat(parts) => join_into(out, parts, " . "),
            Self::Array(items) => {
                out.push_str("array(");
                join_into(out, items, ", ");
                out.push(')');
            }
        }
    }

    /// Evaluate the expression the way PHP would when it runs inside `ctx`.
    ///
    /// Returns `None` for arrays and unbound variables.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvalContext) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Var(var) => ctx.vars.get(var).cloned(),
            Self::CurrentDir => Some(dirname(&ctx.file)),
            Self::CurrentFile => Some(ctx.file.clone()),
            Self::Dirname(inner) => inner.evaluate(ctx).map(|p| dirname(&p)),
            Self::Concat(parts) => parts.iter().map(|p| p.evaluate(ctx)).collect(),
            Self::Array(_) => None,
        }
    }
}

fn join_into(out: &mut String, items: &[PhpExpr], separator: &str) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        item.render_into(out);
    }
}

impl fmt::Display for PhpExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quote a string as a single-quoted PHP literal, like `var_export`.
#[must_use]
pub fn export_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Runtime context for [`PhpExpr::evaluate`].
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    file: String,
    vars: BTreeMap<Variable, String>,
}

impl EvalContext {
    /// Context for code running in the given file.
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            vars: BTreeMap::new(),
        }
    }

    /// Bind a variable.
    #[must_use]
    pub fn bind(mut self, var: Variable, value: impl Into<String>) -> Self {
        self.vars.insert(var, value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quotes_like_var_export() {
        assert_eq!(export_string("Acme\\"), r"'Acme\\'");
        assert_eq!(export_string("it's"), r"'it\'s'");
        assert_eq!(export_string(""), "''");
    }

    #[test]
    fn concat_flattens_and_merges() {
        let expr = PhpExpr::concat([
            PhpExpr::CurrentDir,
            PhpExpr::str("/composer"),
            PhpExpr::concat([PhpExpr::str("/autoload_real_52.php")]),
        ]);
        assert_eq!(
            expr.render(),
            "dirname(__FILE__) . '/composer/autoload_real_52.php'"
        );
        assert_eq!(PhpExpr::concat([PhpExpr::str("x")]), PhpExpr::str("x"));
    }

    #[test]
    fn base_dir_replaces_current_dir_with_vendor_dir() {
        let expr = PhpExpr::dirname(PhpExpr::CurrentDir)
            .replace_current_dir(&PhpExpr::Var(Variable::VendorDir));
        assert_eq!(expr.render(), "dirname($vendorDir)");
    }

    #[test]
    fn evaluates_like_php() {
        let ctx = EvalContext::new("/proj/vendor/composer/autoload_real_52.php")
            .bind(Variable::VendorDir, "/proj/vendor");

        let vendor = PhpExpr::dirname(PhpExpr::CurrentDir);
        assert_eq!(vendor.evaluate(&ctx).as_deref(), Some("/proj/vendor"));

        let lib = PhpExpr::concat([PhpExpr::Var(Variable::VendorDir), PhpExpr::str("/acme")]);
        assert_eq!(lib.evaluate(&ctx).as_deref(), Some("/proj/vendor/acme"));

        assert_eq!(PhpExpr::Var(Variable::BaseDir).evaluate(&ctx), None);
    }

    #[test]
    fn arrays_render_comma_separated() {
        let expr = PhpExpr::array([PhpExpr::str("a"), PhpExpr::Var(Variable::BaseDir)]);
        assert_eq!(expr.render(), "array('a', $baseDir)");
    }

    #[test]
    fn nul_bytes_are_unrenderable() {
        let expr = PhpExpr::concat([PhpExpr::Var(Variable::Dir), PhpExpr::str("/a\0b")]);
        assert_eq!(expr.find_unrenderable(), Some("/a\0b"));
        assert_eq!(PhpExpr::str("fine").find_unrenderable(), None);
    }
}
