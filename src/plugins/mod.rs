//! Plugin handlers invoked as terms, rows and resources load
//!
//! A [`Plugin`] bundles any number of [`Handler`]s under a unique id. The
//! [`PluginRegistry`] keeps one ordered list per handler kind and invokes every
//! registered handler of a kind for each event.

mod label;
mod registry;

pub use label::best_label;
pub use registry::PluginRegistry;

use std::fmt;
use std::sync::Arc;

use crate::channel::Direction;
use crate::loader::BrowseOutcome;
use crate::rdf::Term;
use crate::surface::RowHandle;

/// A completed predicate row
#[derive(Debug, Clone, Copy)]
pub struct RowEvent<'a> {
    pub direction: Direction,
    pub predicate: &'a str,
    /// Every value of the predicate, sorted by raw value
    pub terms: &'a [Term],
    pub row: RowHandle,
}

pub type TermFn = Arc<dyn Fn(&Term, RowHandle) + Send + Sync>;
pub type RowFn = Arc<dyn Fn(&RowEvent<'_>) + Send + Sync>;
pub type ResourceFn = Arc<dyn Fn(&BrowseOutcome) + Send + Sync>;

/// One capability a plugin contributes
#[derive(Clone)]
pub enum Handler {
    NamedNode(TermFn),
    Literal(TermFn),
    BlankNode(TermFn),
    /// Every completed row
    Row(RowFn),
    /// Completed rows of one predicate IRI
    Predicate { iri: String, handler: RowFn },
    /// Literals of one datatype IRI
    Datatype { iri: String, handler: TermFn },
    /// A browse finished both directions
    Resource(ResourceFn),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::NamedNode(_) => f.write_str("NamedNode"),
            Handler::Literal(_) => f.write_str("Literal"),
            Handler::BlankNode(_) => f.write_str("BlankNode"),
            Handler::Row(_) => f.write_str("Row"),
            Handler::Predicate { iri, .. } => write!(f, "Predicate({})", iri),
            Handler::Datatype { iri, .. } => write!(f, "Datatype({})", iri),
            Handler::Resource(_) => f.write_str("Resource"),
        }
    }
}

/// A named bundle of handlers
#[derive(Debug, Clone)]
pub struct Plugin {
    pub id: String,
    pub handlers: Vec<Handler>,
}

impl Plugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handlers: Vec::new(),
        }
    }

    pub fn on_named_node(mut self, f: impl Fn(&Term, RowHandle) + Send + Sync + 'static) -> Self {
        self.handlers.push(Handler::NamedNode(Arc::new(f)));
        self
    }

    pub fn on_literal(mut self, f: impl Fn(&Term, RowHandle) + Send + Sync + 'static) -> Self {
        self.handlers.push(Handler::Literal(Arc::new(f)));
        self
    }

    pub fn on_blank_node(mut self, f: impl Fn(&Term, RowHandle) + Send + Sync + 'static) -> Self {
        self.handlers.push(Handler::BlankNode(Arc::new(f)));
        self
    }

    pub fn on_row(mut self, f: impl Fn(&RowEvent<'_>) + Send + Sync + 'static) -> Self {
        self.handlers.push(Handler::Row(Arc::new(f)));
        self
    }

    pub fn on_predicate(
        mut self,
        iri: impl Into<String>,
        f: impl Fn(&RowEvent<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.push(Handler::Predicate {
            iri: iri.into(),
            handler: Arc::new(f),
        });
        self
    }

    pub fn on_datatype(
        mut self,
        iri: impl Into<String>,
        f: impl Fn(&Term, RowHandle) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.push(Handler::Datatype {
            iri: iri.into(),
            handler: Arc::new(f),
        });
        self
    }

    pub fn on_resource(mut self, f: impl Fn(&BrowseOutcome) + Send + Sync + 'static) -> Self {
        self.handlers.push(Handler::Resource(Arc::new(f)));
        self
    }
}
