//! Paginated retrieval and per-predicate completeness for one direction
//!
//! A [`Channel`] keeps up to `pipeline_depth` page requests in flight, merges
//! pages strictly in page order (responses may arrive in any order), and fires
//! each predicate's completion exactly once, as soon as the [`PageLedger`]
//! proves no further page can add to it.

mod group;
mod in_flight;
mod ledger;
mod rank;

pub use group::PredicateGroup;
pub use in_flight::{ChannelHandle, InFlight};
pub use ledger::{PageEntry, PageLedger};
pub use rank::{PredicateRanker, RowOrder};

use futures::future::BoxFuture;
use futures::stream::{FuturesOrdered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::loader::{BrowseContext, LoaderShared};
use crate::plugins::{RowEvent, best_label};
use crate::rdf::{Binding, Term};
use crate::utils::constants::RDFS_LABEL;
use crate::utils::{BrowseError, BrowseResult, QueryError};

/// Which end of the statements the browsed resource sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Resource is the subject
    Outgoing,
    /// Resource is the object
    Incoming,
}

impl Direction {
    /// Result variable holding the value opposite the resource
    pub fn value_var(self) -> &'static str {
        match self {
            Direction::Outgoing => "object",
            Direction::Incoming => "subject",
        }
    }

    /// SELECT query for this direction, ordered by predicate then value
    pub fn query(self, header: &str, resource: &str) -> String {
        match self {
            Direction::Outgoing => format!(
                "{header}select distinct ?predicate ?object {{\n\t<{resource}> ?predicate ?object .\n}} order by ?predicate ?object"
            ),
            Direction::Incoming => format!(
                "{header}select distinct ?subject ?predicate {{\n\t?subject ?predicate <{resource}> .\n}} order by ?predicate ?subject"
            ),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outgoing => f.write_str("outgoing"),
            Direction::Incoming => f.write_str("incoming"),
        }
    }
}

/// A predicate and all of its values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedRow {
    pub predicate: String,
    pub terms: Vec<Term>,
}

/// Everything one channel gathered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelReport {
    pub triples: usize,
    pub pages: usize,
    pub prefixes_used: BTreeSet<String>,
    /// Rows in presentation order
    pub rows: Vec<CompletedRow>,
    /// Predicates in the order they completed
    pub completion_order: Vec<String>,
}

type PageOutcome = (usize, BrowseResult<Vec<Binding>>);

/// Retrieval and reconciliation engine for one direction
pub struct Channel {
    direction: Direction,
    query: Arc<str>,
    ctx: Arc<BrowseContext>,
    shared: Arc<LoaderShared>,
    groups: HashMap<String, PredicateGroup>,
    rows: RowOrder,
    ledger: PageLedger,
    /// Predicates seen but not yet complete, with a page they appear on
    pending: Vec<(String, usize)>,
    completed: Vec<String>,
    prefixes_used: BTreeSet<String>,
    in_flight: Arc<InFlight>,
    finished: bool,
    triples: usize,
    pages: usize,
}

impl Channel {
    pub fn new(direction: Direction, ctx: Arc<BrowseContext>, shared: Arc<LoaderShared>) -> Self {
        let query = direction.query(&ctx.query_header(), &shared.resource);
        Self {
            direction,
            query: Arc::from(query),
            ctx,
            shared,
            groups: HashMap::new(),
            rows: RowOrder::new(),
            ledger: PageLedger::new(),
            pending: Vec::new(),
            completed: Vec::new(),
            prefixes_used: BTreeSet::new(),
            in_flight: Arc::new(InFlight::new()),
            finished: false,
            triples: 0,
            pages: 0,
        }
    }

    pub fn handle(&self) -> ChannelHandle {
        ChannelHandle::new(self.in_flight.clone())
    }

    /// Drive the query to exhaustion
    pub async fn run(mut self) -> BrowseResult<ChannelReport> {
        let chunk_size = self.ctx.config.chunk_size;
        let in_flight = self.in_flight.clone();
        self.update_status("Querying endpoint...");

        let mut pages: FuturesOrdered<BoxFuture<'static, PageOutcome>> = FuturesOrdered::new();
        let mut next_index = 0;
        while next_index < self.ctx.config.pipeline_depth.max(1) {
            pages.push_back(self.dispatch(next_index));
            next_index += 1;
        }

        while !self.finished {
            let received = tokio::select! {
                biased;
                _ = in_flight.cancelled() => return Err(BrowseError::Aborted),
                received = pages.next() => received,
            };
            let Some((index, outcome)) = received else {
                return Err(BrowseError::Consistency(
                    "page pipeline drained before a terminal page".into(),
                ));
            };
            in_flight.settle(index);
            if in_flight.is_aborted() {
                return Err(BrowseError::Aborted);
            }

            let bindings = outcome?;
            let terminal = bindings.len() < chunk_size;
            if terminal {
                in_flight.cancel_outstanding();
            } else {
                pages.push_back(self.dispatch(next_index));
                next_index += 1;
            }

            self.process_page(index, bindings, terminal)
                .and_then(|()| if terminal { self.finish() } else { Ok(()) })
                .inspect_err(|e| error!(channel = %self.direction, "{}", e))?;
        }

        Ok(self.report())
    }

    fn dispatch(&self, index: usize) -> BoxFuture<'static, PageOutcome> {
        let limit = self.ctx.config.chunk_size;
        let offset = index * limit;
        let executor = self.ctx.executor.clone();
        let shared = self.shared.clone();
        let query = self.query.clone();
        let value_var = self.direction.value_var();

        debug!(channel = %self.direction, page = index, offset, "Dispatching page request");
        let task = tokio::spawn(async move {
            let rows = executor
                .execute(&query, limit, offset, &shared.encoding)
                .await?;
            rows.into_iter()
                .map(|row| Binding::from_row(row, value_var))
                .collect::<Result<Vec<_>, QueryError>>()
        });
        self.in_flight.register(index, task.abort_handle());

        async move {
            let outcome = match task.await {
                Ok(result) => result.map_err(BrowseError::from),
                // cancelled requests carry no data
                Err(e) if e.is_cancelled() => Ok(Vec::new()),
                Err(e) => Err(e.into()),
            };
            (index, outcome)
        }
        .boxed()
    }

    /// Merge one page and fire every predicate it completes
    fn process_page(&mut self, index: usize, bindings: Vec<Binding>, terminal: bool) -> BrowseResult<()> {
        self.pages += 1;
        let entry = match (bindings.first(), bindings.last()) {
            (Some(first), Some(last)) => {
                PageEntry::new(first.predicate.clone(), last.predicate.clone(), terminal)
            }
            _ => PageEntry::empty(),
        };

        if !bindings.is_empty() {
            self.triples += bindings.len();
            self.update_status(&format!("Loaded {} triples...", self.triples));
        }

        let mut seen: Vec<String> = Vec::new();
        for binding in bindings {
            if seen.last() != Some(&binding.predicate) {
                seen.push(binding.predicate.clone());
            }
            self.merge(binding)?;
        }

        self.ledger.record(index, entry)?;
        for predicate in seen {
            match self.pending.iter_mut().find(|(p, _)| *p == predicate) {
                Some(slot) => slot.1 = index,
                None => self.pending.push((predicate, index)),
            }
        }
        self.resolve_pending()
    }

    fn merge(&mut self, binding: Binding) -> BrowseResult<()> {
        let Binding { predicate, value } = binding;
        self.note_prefixes(&predicate, &value);

        let ctx = &self.ctx;
        let group = match self.groups.entry(predicate) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let position = self.rows.insert(&ctx.ranker, &ctx.prefixes, entry.key());
                let row = ctx.surface.open_row(self.direction, entry.key(), position);
                let group = PredicateGroup::new(entry.key().clone(), row);
                entry.insert(group)
            }
        };

        let row = group.row();
        let index = group.insert(value)?;
        let term = &group.terms()[index];
        ctx.surface.insert_value(row, index, term);
        ctx.plugins
            .dispatch_term(term, row, &self.shared.missing_datatypes);
        Ok(())
    }

    fn note_prefixes(&mut self, predicate: &str, value: &Term) {
        let prefixes = &self.ctx.prefixes;
        for iri in [Some(predicate), value.as_iri(), value.datatype()]
            .into_iter()
            .flatten()
        {
            if let Some((prefix, _)) = prefixes.abbreviate(iri) {
                self.prefixes_used.insert(prefix.to_string());
            }
        }
    }

    fn resolve_pending(&mut self) -> BrowseResult<()> {
        let ready: Vec<String> = self
            .pending
            .iter()
            .filter(|(predicate, index)| self.ledger.is_complete(*index, predicate))
            .map(|(predicate, _)| predicate.clone())
            .collect();
        if ready.is_empty() {
            return Ok(());
        }

        self.pending.retain(|(predicate, _)| !ready.contains(predicate));
        for predicate in ready {
            self.complete_predicate(&predicate)?;
        }
        Ok(())
    }

    fn complete_predicate(&mut self, predicate: &str) -> BrowseResult<()> {
        let group = self.groups.get_mut(predicate).ok_or_else(|| {
            BrowseError::Consistency(format!("completed predicate {} has no values", predicate))
        })?;
        group.complete()?;
        debug!(
            channel = %self.direction,
            predicate,
            values = group.terms().len(),
            "completed"
        );

        if self.direction == Direction::Outgoing
            && predicate == RDFS_LABEL
            && let Some(label) = best_label(group.terms(), &self.ctx.config.language)
        {
            self.shared.set_label(label.value());
        }

        self.ctx.plugins.dispatch_row(&RowEvent {
            direction: self.direction,
            predicate,
            terms: group.terms(),
            row: group.row(),
        });
        self.completed.push(predicate.to_string());
        Ok(())
    }

    fn finish(&mut self) -> BrowseResult<()> {
        if !self.pending.is_empty() {
            let left: Vec<&str> = self.pending.iter().map(|(p, _)| p.as_str()).collect();
            return Err(BrowseError::Consistency(format!(
                "predicates left incomplete after the terminal page: {:?}",
                left
            )));
        }
        self.finished = true;
        self.update_status(&format!("{} triples", self.triples));
        info!(
            channel = %self.direction,
            resource = %self.shared.resource,
            triples = self.triples,
            pages = self.pages,
            "Channel finished"
        );
        Ok(())
    }

    fn update_status(&self, text: &str) {
        self.ctx.status.update(self.direction, text);
    }

    fn report(&mut self) -> ChannelReport {
        let mut groups = std::mem::take(&mut self.groups);
        let rows = self
            .rows
            .predicates()
            .filter_map(|predicate| groups.remove(predicate))
            .map(|group| CompletedRow {
                predicate: group.predicate().to_string(),
                terms: group.terms().to_vec(),
            })
            .collect();

        ChannelReport {
            triples: self.triples,
            pages: self.pages,
            prefixes_used: std::mem::take(&mut self.prefixes_used),
            rows,
            completion_order: std::mem::take(&mut self.completed),
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        // detached page tasks must not outlive their channel
        self.in_flight.cancel_outstanding();
    }
}
