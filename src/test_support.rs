//! Scripted collaborators for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::channel::Direction;
use crate::executor::{EncodingPreference, QueryExecutor};
use crate::rdf::{Row, Term};
use crate::surface::{RowHandle, RowSurface};
use crate::utils::QueryError;

pub fn ex(local: &str) -> String {
    format!("http://ex.org/{}", local)
}

fn iri(name: &str) -> String {
    if name.contains("://") {
        name.to_string()
    } else {
        ex(name)
    }
}

/// `"v@en"` is a language literal, IRIs are named nodes, the rest plain literals
fn object(value: &str) -> Term {
    if value.contains("://") {
        Term::named(value)
    } else if let Some((text, lang)) = value.rsplit_once('@') {
        Term::lang_literal(text, lang)
    } else {
        Term::literal(value)
    }
}

fn row(direction: Direction, predicate: &str, value: &str) -> Row {
    let mut row = Row::new();
    row.insert("predicate".to_string(), Term::named(iri(predicate)));
    match direction {
        Direction::Outgoing => row.insert("object".to_string(), object(value)),
        Direction::Incoming => row.insert("subject".to_string(), Term::named(iri(value))),
    };
    row
}

/// Direction a generated query was built for
pub fn direction_of(query: &str) -> Direction {
    if query.contains("?subject ?predicate {") {
        Direction::Incoming
    } else {
        Direction::Outgoing
    }
}

/// Executor answering from per-direction, per-offset scripts.
///
/// Unscripted offsets answer with no rows.
#[derive(Default)]
pub struct ScriptedExecutor {
    pages: HashMap<(Direction, usize), Vec<Row>>,
    failures: HashMap<(Direction, usize), u16>,
    delays: HashMap<(Direction, usize), Duration>,
    held: HashSet<(Direction, usize)>,
    calls: Mutex<Vec<(Direction, usize)>>,
    answered: Mutex<Vec<(Direction, usize)>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, direction: Direction, offset: usize, bindings: &[(&str, &str)]) -> Self {
        let rows = bindings
            .iter()
            .map(|(predicate, value)| row(direction, predicate, value))
            .collect();
        self.pages.insert((direction, offset), rows);
        self
    }

    pub fn fail(mut self, direction: Direction, offset: usize, status: u16) -> Self {
        self.failures.insert((direction, offset), status);
        self
    }

    pub fn delay(mut self, direction: Direction, offset: usize, delay: Duration) -> Self {
        self.delays.insert((direction, offset), delay);
        self
    }

    /// Never answer this request
    pub fn hold(mut self, direction: Direction, offset: usize) -> Self {
        self.held.insert((direction, offset));
        self
    }

    pub fn calls(&self) -> Vec<(Direction, usize)> {
        self.calls.lock().clone()
    }

    pub async fn wait_for_call(&self, direction: Direction, offset: usize) {
        for _ in 0..1000 {
            if self.calls.lock().contains(&(direction, offset)) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("no request for {} at offset {}", direction, offset);
    }

    /// Wait until the request at `offset` has returned its response
    pub async fn wait_for_answer(&self, direction: Direction, offset: usize) {
        for _ in 0..1000 {
            if self.answered.lock().contains(&(direction, offset)) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("no answer for {} at offset {}", direction, offset);
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        query: &str,
        _limit: usize,
        offset: usize,
        _encoding: &EncodingPreference,
    ) -> Result<Vec<Row>, QueryError> {
        let key = (direction_of(query), offset);
        self.calls.lock().push(key);

        if self.held.contains(&key) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        self.answered.lock().push(key);
        if let Some(status) = self.failures.get(&key) {
            return Err(QueryError::Transport {
                status: *status,
                body: String::new(),
            });
        }
        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }
}

/// Surface logging every placement as text
#[derive(Default)]
pub struct RecordingSurface {
    next: AtomicU64,
    rows: Mutex<HashMap<RowHandle, String>>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl RecordingSurface {
    pub fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }
}

impl RowSurface for RecordingSurface {
    fn open_row(&self, _direction: Direction, predicate: &str, position: usize) -> RowHandle {
        let handle = RowHandle(self.next.fetch_add(1, Ordering::Relaxed));
        let local = local_name(predicate).to_string();
        self.log.lock().push(format!("open {} at {}", local, position));
        self.rows.lock().insert(handle, local);
        handle
    }

    fn insert_value(&self, row: RowHandle, index: usize, term: &Term) {
        let predicate = self.rows.lock().get(&row).cloned().unwrap_or_default();
        self.log
            .lock()
            .push(format!("value {} {} at {}", predicate, term.value(), index));
    }
}

pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['/', '#']).next().unwrap_or(iri)
}
