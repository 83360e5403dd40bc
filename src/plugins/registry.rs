//! Ordered handler collections with plugin id bookkeeping

use dashmap::DashSet;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use super::{Handler, Plugin, ResourceFn, RowEvent, RowFn, TermFn};
use crate::loader::BrowseOutcome;
use crate::rdf::Term;
use crate::surface::RowHandle;
use crate::utils::{BrowseError, BrowseResult};

/// Handler keyed by IRI, remembering which plugin installed it
#[derive(Clone)]
struct Owned<F> {
    owner: String,
    handler: F,
}

/// Registry of every handler contributed by registered plugins
#[derive(Default, Clone)]
pub struct PluginRegistry {
    ids: HashSet<String>,
    named_node: Vec<TermFn>,
    literal: Vec<TermFn>,
    blank_node: Vec<TermFn>,
    row: Vec<RowFn>,
    predicates: HashMap<String, Owned<RowFn>>,
    datatypes: HashMap<String, Owned<TermFn>>,
    resource: Vec<ResourceFn>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin; ids must be unique
    pub fn register(&mut self, plugin: Plugin) -> BrowseResult<()> {
        if !self.ids.insert(plugin.id.clone()) {
            return Err(BrowseError::Plugin(format!(
                "cannot load plugin that has already been loaded or has a conflicting id: {}",
                plugin.id
            )));
        }

        for handler in plugin.handlers {
            match handler {
                Handler::NamedNode(f) => self.named_node.push(f),
                Handler::Literal(f) => self.literal.push(f),
                Handler::BlankNode(f) => self.blank_node.push(f),
                Handler::Row(f) => self.row.push(f),
                Handler::Resource(f) => self.resource.push(f),
                Handler::Predicate { iri, handler } => {
                    if let Some(previous) = self.predicates.get(&iri) {
                        warn!(
                            "plugin '{}' will override a predicate mapping for '{}' previously defined by plugin '{}'",
                            plugin.id, iri, previous.owner
                        );
                    }
                    self.predicates.insert(
                        iri,
                        Owned {
                            owner: plugin.id.clone(),
                            handler,
                        },
                    );
                }
                Handler::Datatype { iri, handler } => {
                    if let Some(previous) = self.datatypes.get(&iri) {
                        warn!(
                            "plugin '{}' will override a literal mapping for '{}' previously defined by plugin '{}'",
                            plugin.id, iri, previous.owner
                        );
                    }
                    self.datatypes.insert(
                        iri,
                        Owned {
                            owner: plugin.id.clone(),
                            handler,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Invoke the term handlers matching the term's kind.
    ///
    /// Datatypes without a mapping are reported once per `missing` set.
    pub fn dispatch_term(&self, term: &Term, row: RowHandle, missing: &DashSet<String>) {
        let handlers = match term {
            Term::NamedNode { .. } => &self.named_node,
            Term::BlankNode { .. } => &self.blank_node,
            Term::Literal { .. } => {
                if let Some(datatype) = term.datatype() {
                    match self.datatypes.get(datatype) {
                        Some(mapping) => (mapping.handler)(term, row),
                        None => {
                            if missing.insert(datatype.to_string()) {
                                warn!("no datatype mapping for {}", datatype);
                            }
                        }
                    }
                }
                &self.literal
            }
        };
        for handler in handlers {
            handler(term, row);
        }
    }

    /// Invoke the predicate-specific handler, then every row handler
    pub fn dispatch_row(&self, event: &RowEvent<'_>) {
        if let Some(mapping) = self.predicates.get(event.predicate) {
            (mapping.handler)(event);
        }
        for handler in &self.row {
            handler(event);
        }
    }

    pub fn dispatch_resource(&self, outcome: &BrowseOutcome) {
        for handler in &self.resource {
            handler(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Direction;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(Plugin::new("a")).unwrap();
        assert!(matches!(
            registry.register(Plugin::new("a")),
            Err(BrowseError::Plugin(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn term_handlers_follow_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        for id in ["first", "second"] {
            let seen = seen.clone();
            registry
                .register(Plugin::new(id).on_named_node(move |term, _| {
                    seen.lock().push(format!("{}:{}", id, term.value()));
                }))
                .unwrap();
        }

        let missing = DashSet::new();
        registry.dispatch_term(&Term::named("http://ex.org/x"), RowHandle(0), &missing);
        registry.dispatch_term(&Term::literal("ignored"), RowHandle(0), &missing);

        assert_eq!(
            *seen.lock(),
            vec!["first:http://ex.org/x", "second:http://ex.org/x"]
        );
    }

    #[test]
    fn datatype_mapping_and_missing_bookkeeping() {
        let hits = Arc::new(Mutex::new(0usize));
        let mut registry = PluginRegistry::new();
        let counter = hits.clone();
        registry
            .register(Plugin::new("dates").on_datatype(
                "http://www.w3.org/2001/XMLSchema#date",
                move |_, _| *counter.lock() += 1,
            ))
            .unwrap();

        let missing = DashSet::new();
        let date = Term::typed_literal("2020-01-01", "http://www.w3.org/2001/XMLSchema#date");
        let int = Term::typed_literal("1", "http://www.w3.org/2001/XMLSchema#int");
        registry.dispatch_term(&date, RowHandle(1), &missing);
        registry.dispatch_term(&int, RowHandle(1), &missing);
        registry.dispatch_term(&int, RowHandle(1), &missing);

        assert_eq!(*hits.lock(), 1);
        assert_eq!(missing.len(), 1);
        assert!(missing.contains("http://www.w3.org/2001/XMLSchema#int"));
    }

    #[test]
    fn predicate_handler_runs_before_row_handlers() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        let (a, b) = (order.clone(), order.clone());
        registry
            .register(
                Plugin::new("p")
                    .on_row(move |_| a.lock().push("row"))
                    .on_predicate("http://ex.org/p", move |_| b.lock().push("predicate")),
            )
            .unwrap();

        let terms = vec![Term::literal("v")];
        registry.dispatch_row(&RowEvent {
            direction: Direction::Outgoing,
            predicate: "http://ex.org/p",
            terms: &terms,
            row: RowHandle(3),
        });
        assert_eq!(*order.lock(), vec!["predicate", "row"]);
    }
}
