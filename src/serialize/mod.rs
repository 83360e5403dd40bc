//! Text serializations of a finished browse

mod ntriples;
mod turtle;

pub use ntriples::NTriplesSerializer;
pub use turtle::TurtleSerializer;

use std::collections::HashMap;

use crate::loader::BrowseOutcome;
use crate::rdf::{PrefixMap, Term};
use crate::utils::{BrowseError, BrowseResult};

/// Writes both directions of a [`BrowseOutcome`] as RDF text
pub trait TripleSerializer: Send + Sync {
    fn mime_type(&self) -> &'static str;

    fn serialize(&self, outcome: &BrowseOutcome, prefixes: &PrefixMap) -> String;
}

/// Serializer for a MIME type or short format name
pub fn serializer_for(format: &str) -> BrowseResult<Box<dyn TripleSerializer>> {
    let mime = format.split(';').next().unwrap_or(format).trim();
    match mime.to_ascii_lowercase().as_str() {
        "text/turtle" | "application/x-turtle" | "turtle" | "ttl" => Ok(Box::new(TurtleSerializer)),
        "application/n-triples" | "n-triples" | "ntriples" | "nt" => {
            Ok(Box::new(NTriplesSerializer))
        }
        _ => Err(BrowseError::UnsupportedFormat(format.to_string())),
    }
}

/// Blank node labels `_:b0`, `_:b1`, ... in order of first use.
///
/// Endpoint ids such as `nodeID://b10001` are not valid labels, and one id
/// must map to the same label throughout a document.
#[derive(Debug, Default)]
struct BlankLabels {
    labels: HashMap<String, String>,
}

impl BlankLabels {
    fn label(&mut self, id: &str) -> String {
        let next = self.labels.len();
        self.labels
            .entry(id.to_string())
            .or_insert_with(|| format!("_:b{}", next))
            .clone()
    }

    fn turtle(&mut self, term: &Term, prefixes: &PrefixMap) -> String {
        match term {
            Term::BlankNode { id } => self.label(id),
            other => other.to_turtle(prefixes),
        }
    }

    fn ntriples(&mut self, term: &Term) -> String {
        match term {
            Term::BlankNode { id } => self.label(id),
            other => other.to_ntriples(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_resolve_by_mime_or_name() {
        assert_eq!(serializer_for("text/turtle").unwrap().mime_type(), "text/turtle");
        assert_eq!(
            serializer_for("text/turtle; charset=utf-8").unwrap().mime_type(),
            "text/turtle"
        );
        assert_eq!(serializer_for("nt").unwrap().mime_type(), "application/n-triples");
        assert!(matches!(
            serializer_for("application/ld+json"),
            Err(BrowseError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn blank_labels_are_stable_per_id() {
        let mut labels = BlankLabels::default();
        let prefixes = PrefixMap::default();
        assert_eq!(labels.ntriples(&Term::blank("nodeID://x")), "_:b0");
        assert_eq!(labels.turtle(&Term::blank("nodeID://y"), &prefixes), "_:b1");
        assert_eq!(labels.ntriples(&Term::blank("nodeID://x")), "_:b0");
        assert_eq!(labels.ntriples(&Term::named("http://ex.org/a")), "<http://ex.org/a>");
    }
}
