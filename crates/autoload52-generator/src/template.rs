//! Fixed PHP skeletons with named `{{placeholder}}` slots.
//!
//! Every slot must be bound and every binding must be used; a mismatch is a
//! generator bug and surfaces as a template error instead of a broken file.

use crate::php::PhpExpr;
use autoload52_core::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// A named PHP skeleton.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    name: &'static str,
    source: &'static str,
}

impl Template {
    /// Create a template.
    #[must_use]
    pub const fn new(name: &'static str, source: &'static str) -> Self {
        Self { name, source }
    }

    /// Template name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Start binding values for this template.
    #[must_use]
    pub fn bind(&self) -> Bindings {
        Bindings {
            template: *self,
            values: BTreeMap::new(),
            error: None,
        }
    }

    fn render(&self, values: &BTreeMap<&'static str, String>) -> Result<String> {
        let mut out = String::with_capacity(self.source.len() + 256);
        let mut used = BTreeSet::new();
        let mut rest = self.source;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| {
                Error::placeholder(self.name, "unterminated placeholder")
            })?;
            let key = after[..end].trim();
            let value = values.get(key).ok_or_else(|| {
                Error::placeholder(self.name, format!("placeholder '{key}' is not bound"))
            })?;
            out.push_str(value);
            used.insert(key);
            rest = &after[end + 2..];
        }
        out.push_str(rest);

        if let Some(unused) = values.keys().find(|k| !used.contains(**k)) {
            return Err(Error::placeholder(
                self.name,
                format!("binding '{unused}' has no placeholder"),
            ));
        }

        Ok(out)
    }
}

/// Values for one rendering of a [`Template`].
#[derive(Debug)]
pub struct Bindings {
    template: Template,
    values: BTreeMap<&'static str, String>,
    error: Option<Error>,
}

impl Bindings {
    /// Bind a PHP expression.
    #[must_use]
    pub fn expr(mut self, key: &'static str, expr: &PhpExpr) -> Self {
        if let Some(bad) = expr.find_unrenderable() {
            self.fail(Error::unrenderable(
                self.template.name,
                format!("'{}' for '{key}' contains a NUL byte", bad.escape_debug()),
            ));
        }
        self.values.insert(key, expr.render());
        self
    }

    /// Bind an identifier fragment such as the suffix.
    #[must_use]
    pub fn ident(mut self, key: &'static str, value: &str) -> Self {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            self.fail(Error::unrenderable(
                self.template.name,
                format!("'{value}' for '{key}' is not a valid identifier fragment"),
            ));
        }
        self.values.insert(key, value.to_string());
        self
    }

    /// Bind an integer.
    #[must_use]
    pub fn int(mut self, key: &'static str, value: usize) -> Self {
        self.values.insert(key, value.to_string());
        self
    }

    /// Bind code the generator assembled itself.
    #[must_use]
    pub fn code(mut self, key: &'static str, code: impl Into<String>) -> Self {
        self.values.insert(key, code.into());
        self
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Render the template.
    ///
    /// # Errors
    /// Returns a template error for unrenderable values or a placeholder
    /// mismatch.
    pub fn render(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.template.render(&self.values)
    }
}
