//! RDF terms, result-row parsing and prefix handling

mod prefixes;
mod term;

pub use prefixes::PrefixMap;
pub use term::{Binding, LiteralKind, Row, Term, parse_results};
