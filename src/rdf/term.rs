//! RDF terms as they arrive in SPARQL JSON result rows
//!
//! A term is a named node, a blank node or a literal. Literals carry either a
//! language tag or a datatype, never both.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::prefixes::PrefixMap;
use crate::utils::QueryError;

/// Annotation attached to a literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Plain,
    Language(String),
    Typed(String),
}

/// A parsed value from a result binding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Term {
    NamedNode { iri: String },
    BlankNode { id: String },
    Literal { value: String, kind: LiteralKind },
}

impl Term {
    pub fn named(iri: impl Into<String>) -> Self {
        Term::NamedNode { iri: iri.into() }
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode { id: id.into() }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            kind: LiteralKind::Plain,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            kind: LiteralKind::Language(language.into()),
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            kind: LiteralKind::Typed(datatype.into()),
        }
    }

    /// Raw textual value, used for ordering values within a predicate
    pub fn value(&self) -> &str {
        match self {
            Term::NamedNode { iri } => iri,
            Term::BlankNode { id } => id,
            Term::Literal { value, .. } => value,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::NamedNode { iri } => Some(iri),
            _ => None,
        }
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            Term::Literal {
                kind: LiteralKind::Language(lang),
                ..
            } => Some(lang),
            _ => None,
        }
    }

    pub fn datatype(&self) -> Option<&str> {
        match self {
            Term::Literal {
                kind: LiteralKind::Typed(datatype),
                ..
            } => Some(datatype),
            _ => None,
        }
    }

    /// Turtle token, abbreviating IRIs with the given prefixes
    pub fn to_turtle(&self, prefixes: &PrefixMap) -> String {
        match self {
            Term::NamedNode { iri } => prefixes.terse(iri),
            Term::BlankNode { id } => blank_token(id),
            Term::Literal { value, kind } => match kind {
                LiteralKind::Plain => quote(value),
                LiteralKind::Language(lang) => format!("{}@{}", quote(value), lang),
                LiteralKind::Typed(datatype) => {
                    format!("{}^^{}", quote(value), prefixes.terse(datatype))
                }
            },
        }
    }

    /// N-Triples token (IRIs always written out in full)
    pub fn to_ntriples(&self) -> String {
        match self {
            Term::NamedNode { iri } => format!("<{}>", iri),
            Term::BlankNode { id } => blank_token(id),
            Term::Literal { value, kind } => match kind {
                LiteralKind::Plain => quote(value),
                LiteralKind::Language(lang) => format!("{}@{}", quote(value), lang),
                LiteralKind::Typed(datatype) => format!("{}^^<{}>", quote(value), datatype),
            },
        }
    }
}

/// Blank node token, replacing characters a label may not contain
fn blank_token(id: &str) -> String {
    let label: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-') { c } else { '_' })
        .collect();
    match label.chars().next() {
        Some(first) if first != '-' => format!("_:{}", label),
        _ => format!("_:b{}", label),
    }
}

/// Quote and escape a literal lexical form
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Term exactly as encoded in `application/sparql-results+json`
#[derive(Debug, Deserialize)]
struct RawTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(rename = "xml:lang", alias = "lang", default)]
    language: Option<String>,
    #[serde(default)]
    datatype: Option<String>,
}

impl TryFrom<RawTerm> for Term {
    type Error = QueryError;

    fn try_from(raw: RawTerm) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "uri" => Ok(Term::named(raw.value)),
            "bnode" => Ok(Term::blank(raw.value)),
            "literal" | "typed-literal" => {
                let kind = match (raw.language, raw.datatype) {
                    (Some(lang), _) if !lang.is_empty() => LiteralKind::Language(lang),
                    (_, Some(datatype)) if !datatype.is_empty() => LiteralKind::Typed(datatype),
                    _ => LiteralKind::Plain,
                };
                Ok(Term::Literal {
                    value: raw.value,
                    kind,
                })
            }
            other => Err(QueryError::Protocol(format!(
                "sparql-results included unknown term type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultsDocument {
    results: ResultsBody,
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    bindings: Vec<HashMap<String, RawTerm>>,
}

/// One solution: variable name to bound term
pub type Row = HashMap<String, Term>;

/// Parse a SPARQL JSON results payload into rows
pub fn parse_results(body: &str) -> Result<Vec<Row>, QueryError> {
    let document: ResultsDocument = serde_json::from_str(body)?;
    document
        .results
        .bindings
        .into_iter()
        .map(|binding| {
            binding
                .into_iter()
                .map(|(var, raw)| Term::try_from(raw).map(|term| (var, term)))
                .collect::<Result<Row, QueryError>>()
        })
        .collect()
}

/// One `(predicate, value)` statement for a channel direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub predicate: String,
    pub value: Term,
}

impl Binding {
    pub fn new(predicate: impl Into<String>, value: Term) -> Self {
        Self {
            predicate: predicate.into(),
            value,
        }
    }

    /// Pick the `?predicate` and value variable out of a result row
    pub fn from_row(mut row: Row, value_var: &str) -> Result<Self, QueryError> {
        let predicate = match row.remove("predicate") {
            Some(Term::NamedNode { iri }) => iri,
            Some(other) => {
                return Err(QueryError::Protocol(format!(
                    "predicate bound to a non-IRI term: {:?}",
                    other
                )));
            }
            None => return Err(QueryError::Protocol("row is missing ?predicate".into())),
        };
        let value = row
            .remove(value_var)
            .ok_or_else(|| QueryError::Protocol(format!("row is missing ?{}", value_var)))?;
        Ok(Self { predicate, value })
    }
}
