//! Prefix table used to abbreviate IRIs into terse `prefix:local` form

use std::collections::BTreeMap;

use crate::utils::constants::{INTERNAL_PREFIXES, QUERY_HEADER};

/// Namespace prefixes, matched longest-namespace-first
#[derive(Debug, Clone, Default)]
pub struct PrefixMap {
    entries: BTreeMap<String, String>,
}

impl PrefixMap {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Prefix table with the built-in vocabularies only
    pub fn internal() -> Self {
        Self::new(
            INTERNAL_PREFIXES
                .iter()
                .map(|(prefix, ns)| (prefix.to_string(), ns.to_string()))
                .collect(),
        )
    }

    /// Add or replace a prefix
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.entries.insert(prefix.into(), namespace.into());
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    /// Split an IRI into `(prefix, local)` if some namespace abbreviates it
    pub fn abbreviate<'a>(&'a self, iri: &'a str) -> Option<(&'a str, &'a str)> {
        self.entries
            .iter()
            .filter(|(_, ns)| iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, ns)| (prefix.as_str(), &iri[ns.len()..]))
            .filter(|(_, local)| is_local_name(local))
    }

    /// Terse form of an IRI: `prefix:local` or `<iri>`
    pub fn terse(&self, iri: &str) -> String {
        match self.abbreviate(iri) {
            Some((prefix, local)) => format!("{}:{}", prefix, local),
            None => format!("<{}>", iri),
        }
    }

    /// Expand `prefix:local` back to a full IRI
    pub fn expand(&self, terse: &str) -> Option<String> {
        let (prefix, local) = terse.split_once(':')?;
        self.namespace(prefix).map(|ns| format!("{}{}", ns, local))
    }

    /// Accept `<iri>`, `prefix:local` or a bare IRI and return the full IRI
    pub fn resolve(&self, input: &str) -> String {
        let input = input.trim();
        if let Some(iri) = input.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            return iri.to_string();
        }
        if !input.contains("://")
            && let Some(iri) = self.expand(input)
        {
            return iri;
        }
        input.to_string()
    }

    /// Query preamble declaring every prefix
    pub fn query_header(&self) -> String {
        if self.entries.is_empty() {
            return QUERY_HEADER.to_string();
        }
        self.entries
            .iter()
            .map(|(prefix, ns)| format!("prefix {}: <{}>\n", prefix, ns))
            .collect()
    }
}

/// Conservative check for a Turtle local name
fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    (first.is_alphanumeric() || first == '_')
        && !local.ends_with('.')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
