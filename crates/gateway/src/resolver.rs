//! Mapping between canonical tool names and provider-safe names.
//!
//! Providers accept only `[a-zA-Z0-9_-]` in function names. Canonical names
//! are sanitized on the way out and resolved on the way back in.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::catalog::Catalog;

/// Replace every character outside `[a-zA-Z0-9_-]` with `_`.
///
/// Pure and idempotent.
pub fn sanitize(name: &str) -> Cow<'_, str> {
    if name.chars().all(is_safe) {
        return Cow::Borrowed(name);
    }
    Cow::Owned(
        name.chars()
            .map(|c| if is_safe(c) { c } else { '_' })
            .collect(),
    )
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Resolve a provider-issued name back to its canonical catalog name.
///
/// Exact match first, then a reverse search over sanitized catalog names,
/// then the input unchanged.
pub fn resolve(catalog: &Catalog, name: &str) -> String {
    NameResolver::new(catalog).resolve(name).to_string()
}

/// Precomputed reverse table for one catalog snapshot.
///
/// Assumes canonical names stay unique under sanitization; on collision the
/// earliest tool in catalog order wins.
#[derive(Debug, Clone)]
pub struct NameResolver<'a> {
    catalog: &'a Catalog,
    reverse: HashMap<String, &'a str>,
}

impl<'a> NameResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        let mut reverse = HashMap::with_capacity(catalog.len());
        for tool in catalog.list() {
            reverse
                .entry(sanitize(&tool.name).into_owned())
                .or_insert(tool.name.as_str());
        }
        Self { catalog, reverse }
    }

    /// Canonical name for `name`, or `name` itself when nothing matches.
    pub fn resolve<'n>(&self, name: &'n str) -> &'n str
    where
        'a: 'n,
    {
        if self.catalog.contains(name) {
            return name;
        }
        self.reverse.get(name).copied().unwrap_or(name)
    }

    /// Whether `name` maps to a catalog entry.
    pub fn is_known(&self, name: &str) -> bool {
        self.catalog.contains(self.resolve(name))
    }
}
