use super::{BlankLabels, TripleSerializer};
use crate::loader::BrowseOutcome;
use crate::rdf::PrefixMap;

/// One statement per line, IRIs in full
#[derive(Debug, Default, Clone, Copy)]
pub struct NTriplesSerializer;

impl TripleSerializer for NTriplesSerializer {
    fn mime_type(&self) -> &'static str {
        "application/n-triples"
    }

    fn serialize(&self, outcome: &BrowseOutcome, _prefixes: &PrefixMap) -> String {
        let resource = format!("<{}>", outcome.resource);
        let mut labels = BlankLabels::default();
        let mut out = String::new();
        for row in &outcome.outgoing.rows {
            for value in &row.terms {
                out.push_str(&format!(
                    "{} <{}> {} .\n",
                    resource,
                    row.predicate,
                    labels.ntriples(value)
                ));
            }
        }
        for row in &outcome.incoming.rows {
            for subject in &row.terms {
                out.push_str(&format!(
                    "{} <{}> {} .\n",
                    labels.ntriples(subject),
                    row.predicate,
                    resource
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Term;
    use crate::serialize::fixtures;

    #[test]
    fn every_statement_on_its_own_line() {
        let out = NTriplesSerializer.serialize(&fixtures::outcome(), &fixtures::prefixes());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"<http://ex.org/cat> <http://www.w3.org/2000/01/rdf-schema#label> "Cat"@en ."#,
                r#"<http://ex.org/cat> <http://www.w3.org/2000/01/rdf-schema#label> "Chat"@fr ."#,
                r#"<http://ex.org/cat> <http://ex.org/age> "3"^^<http://www.w3.org/2001/XMLSchema#integer> ."#,
                r#"<http://ex.org/tom> <http://ex.org/likes> <http://ex.org/cat> ."#,
            ]
        );
    }

    #[test]
    fn blank_nodes_are_relabelled_consistently() {
        let mut outcome = fixtures::outcome();
        outcome.outgoing.rows.push(fixtures::awkward_row());
        outcome.incoming.rows[0].terms.push(Term::blank("nodeID://b10001"));

        let out = NTriplesSerializer.serialize(&outcome, &fixtures::prefixes());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines[3..],
            [
                "<http://ex.org/cat> <http://ex.org/-dash> _:b0 .",
                "<http://ex.org/cat> <http://ex.org/-dash> <http://ex.org/.hidden> .",
                "<http://ex.org/cat> <http://ex.org/-dash> _:b1 .",
                "<http://ex.org/tom> <http://ex.org/likes> <http://ex.org/cat> .",
                "_:b0 <http://ex.org/likes> <http://ex.org/cat> .",
            ]
        );
    }
}
