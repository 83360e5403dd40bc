use std::collections::BTreeSet;

use super::{BlankLabels, TripleSerializer};
use crate::channel::ChannelReport;
use crate::loader::BrowseOutcome;
use crate::rdf::PrefixMap;

/// Turtle with boxed comment headers per direction
#[derive(Debug, Default, Clone, Copy)]
pub struct TurtleSerializer;

impl TripleSerializer for TurtleSerializer {
    fn mime_type(&self) -> &'static str {
        "text/turtle"
    }

    fn serialize(&self, outcome: &BrowseOutcome, prefixes: &PrefixMap) -> String {
        let mut used: BTreeSet<&str> = outcome
            .outgoing
            .prefixes_used
            .iter()
            .chain(&outcome.incoming.prefixes_used)
            .map(String::as_str)
            .collect();
        if let Some((prefix, _)) = prefixes.abbreviate(&outcome.resource) {
            used.insert(prefix);
        }

        let mut out = String::new();
        for prefix in used {
            if let Some(namespace) = prefixes.namespace(prefix) {
                out.push_str(&format!("@prefix {}: <{}> .\n", prefix, namespace));
            }
        }
        out.push('\n');

        let resource = prefixes.terse(&outcome.resource);
        let mut labels = BlankLabels::default();
        banner(&mut out, "Outgoing", &outcome.resource_terse);
        outgoing(&mut out, &resource, &outcome.outgoing, prefixes, &mut labels);
        out.push_str("\n\n");
        banner(&mut out, "Incoming", &outcome.resource_terse);
        incoming(&mut out, &resource, &outcome.incoming, prefixes, &mut labels);
        out
    }
}

fn banner(out: &mut String, direction: &str, resource: &str) {
    let text = format!("   {} properties for '{}'   ", direction, resource);
    let border = format!("+{}+", "-".repeat(text.chars().count()));
    out.push_str(&format!("# {}\n# |{}|\n# {}\n", border, text, border));
}

/// `resource p v1, v2 ;` with one predicate per line
fn outgoing(
    out: &mut String,
    resource: &str,
    report: &ChannelReport,
    prefixes: &PrefixMap,
    labels: &mut BlankLabels,
) {
    let lines: Vec<String> = report
        .rows
        .iter()
        .map(|row| {
            let values: Vec<String> = row.terms.iter().map(|t| labels.turtle(t, prefixes)).collect();
            format!("{} {}", prefixes.terse(&row.predicate), values.join(", "))
        })
        .collect();
    if !lines.is_empty() {
        out.push_str(&format!("{} {} .\n", resource, lines.join(" ;\n\t")));
    }
}

fn incoming(
    out: &mut String,
    resource: &str,
    report: &ChannelReport,
    prefixes: &PrefixMap,
    labels: &mut BlankLabels,
) {
    for row in &report.rows {
        let predicate = prefixes.terse(&row.predicate);
        for subject in &row.terms {
            out.push_str(&format!(
                "{} {} {} .\n",
                labels.turtle(subject, prefixes),
                predicate,
                resource
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Term;
    use crate::serialize::fixtures;

    #[test]
    fn writes_used_prefixes_banners_and_both_blocks() {
        let out = TurtleSerializer.serialize(&fixtures::outcome(), &fixtures::prefixes());

        assert!(out.starts_with(
            "@prefix ex: <http://ex.org/> .\n\
             @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
             @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\n"
        ));
        assert!(!out.contains("@prefix owl:"));

        let text = "   Outgoing properties for 'ex:cat'   ";
        let border = format!("# +{}+", "-".repeat(text.len()));
        assert!(out.contains(&format!("{}\n# |{}|\n{}\n", border, text, border)));
        assert!(out.contains("# |   Incoming properties for 'ex:cat'   |"));

        assert!(out.contains(
            "ex:cat rdfs:label \"Cat\"@en, \"Chat\"@fr ;\n\tex:age \"3\"^^xsd:integer .\n"
        ));
        assert!(out.ends_with("ex:tom ex:likes ex:cat .\n"));
    }

    #[test]
    fn awkward_names_and_blank_nodes_stay_valid() {
        let mut outcome = fixtures::outcome();
        outcome.outgoing.rows.push(fixtures::awkward_row());
        outcome.incoming.rows[0].terms.push(Term::blank("nodeID://b10001"));

        let out = TurtleSerializer.serialize(&outcome, &fixtures::prefixes());

        assert!(out.contains(
            "\t<http://ex.org/-dash> _:b0, <http://ex.org/.hidden>, _:b1 .\n"
        ));
        assert!(out.ends_with("ex:tom ex:likes ex:cat .\n_:b0 ex:likes ex:cat .\n"));
        assert!(!out.contains("nodeID"));
        assert!(!out.contains("ex:-dash"));
        assert!(!out.contains("ex:.hidden"));
    }

    #[test]
    fn empty_directions_keep_their_banners() {
        let mut outcome = fixtures::outcome();
        outcome.outgoing.rows.clear();
        outcome.incoming.rows.clear();

        let out = TurtleSerializer.serialize(&outcome, &fixtures::prefixes());

        assert!(out.contains("Outgoing properties for 'ex:cat'"));
        assert!(out.contains("Incoming properties for 'ex:cat'"));
        assert!(!out.contains("ex:cat rdfs:label"));
        assert!(!out.contains("ex:likes"));
    }
}
