//! Session holding the current browse
//!
//! A session owns at most one Loader at a time. Starting a new browse aborts
//! the current Loader and waits for its task to stop before the new Loader
//! issues any request, so results of two resources never interleave.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::Config;
use crate::loader::{BrowseContext, BrowseOutcome, Loader, LoaderHandle};
use crate::serialize::serializer_for;
use crate::utils::{BrowseError, BrowseResult};

/// Browse lifecycle as seen from the session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowseStatus {
    /// Nothing browsed yet
    #[default]
    Idle,
    /// Both channels still loading
    Loading,
    /// Both channels finished
    Complete,
    /// A page request or consistency check failed
    Failed,
    /// Replaced or stopped before completion
    Aborted,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Option<Uuid>,
    pub resource: Option<String>,
    pub status: BrowseStatus,
    pub label: Option<String>,
    pub outgoing_triples: usize,
    pub incoming_triples: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message (if failed)
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    snapshot: SessionSnapshot,
    outcome: Option<Arc<BrowseOutcome>>,
}

/// Loader currently owned by the session
struct Current {
    handle: LoaderHandle,
    task: JoinHandle<()>,
}

pub struct Session {
    ctx: Arc<BrowseContext>,
    current: Mutex<Option<Current>>,
    state: Arc<watch::Sender<SessionState>>,
}

impl Session {
    pub fn new(ctx: BrowseContext) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            ctx: Arc::new(ctx),
            current: Mutex::new(None),
            state: Arc::new(state),
        }
    }

    /// Session querying the configured endpoint over HTTP
    pub fn from_config(config: Config) -> BrowseResult<Self> {
        Ok(Self::new(BrowseContext::from_config(config)?))
    }

    pub fn context(&self) -> &BrowseContext {
        &self.ctx
    }

    /// Abort any current browse, then start browsing `resource`.
    ///
    /// An invalid resource leaves the current browse running.
    pub async fn browse(&self, resource: &str) -> BrowseResult<Uuid> {
        let loader = Loader::new(resource, self.ctx.clone())?;

        let mut current = self.current.lock().await;
        if let Some(old) = current.take() {
            stop(old).await;
            self.mark_aborted();
        }

        let id = loader.id();
        let handle = loader.handle();
        self.state.send_replace(SessionState {
            snapshot: SessionSnapshot {
                id: Some(id),
                resource: Some(loader.resource().to_string()),
                status: BrowseStatus::Loading,
                started_at: Some(Utc::now()),
                ..SessionSnapshot::default()
            },
            outcome: None,
        });
        log::info!("Started browse {} of {}", id, loader.resource());

        let state = self.state.clone();
        let task = tokio::spawn(async move {
            let result = loader.run().await;
            state.send_modify(|state| {
                if state.snapshot.id != Some(id) {
                    return;
                }
                state.snapshot.finished_at = Some(Utc::now());
                match result {
                    Ok(outcome) => {
                        state.snapshot.status = BrowseStatus::Complete;
                        state.snapshot.label = outcome.label.clone();
                        state.snapshot.outgoing_triples = outcome.outgoing.triples;
                        state.snapshot.incoming_triples = outcome.incoming.triples;
                        state.outcome = Some(Arc::new(outcome));
                    }
                    Err(BrowseError::Aborted) => {
                        state.snapshot.status = BrowseStatus::Aborted;
                    }
                    Err(e) => {
                        state.snapshot.status = BrowseStatus::Failed;
                        state.snapshot.error = Some(e.to_string());
                    }
                }
            });
        });

        *current = Some(Current { handle, task });
        Ok(id)
    }

    /// Abort the current browse, if any
    pub async fn abort(&self) {
        if let Some(old) = self.current.lock().await.take() {
            stop(old).await;
            self.mark_aborted();
        }
    }

    /// Wait for the current browse to settle
    pub async fn wait(&self) -> BrowseResult<Arc<BrowseOutcome>> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| state.snapshot.status != BrowseStatus::Loading)
            .await
            .map_err(|e| BrowseError::Task(e.to_string()))?
            .clone();

        match state.snapshot.status {
            BrowseStatus::Complete => state.outcome.ok_or(BrowseError::NotReady),
            BrowseStatus::Aborted => Err(BrowseError::Aborted),
            BrowseStatus::Failed => Err(BrowseError::Task(state.snapshot.error.unwrap_or_default())),
            BrowseStatus::Idle | BrowseStatus::Loading => Err(BrowseError::NotReady),
        }
    }

    pub fn status(&self) -> SessionSnapshot {
        self.state.borrow().snapshot.clone()
    }

    /// Outcome of the current browse once both channels finished
    pub fn outcome(&self) -> Option<Arc<BrowseOutcome>> {
        self.state.borrow().outcome.clone()
    }

    /// Serialize the completed browse; `None` uses the configured format
    pub fn serialize(&self, format: Option<&str>) -> BrowseResult<String> {
        let outcome = self.outcome().ok_or(BrowseError::NotReady)?;
        let serializer = serializer_for(format.unwrap_or(&self.ctx.config.default_format))?;
        Ok(serializer.serialize(&outcome, &self.ctx.prefixes))
    }

    fn mark_aborted(&self) {
        self.state.send_modify(|state| {
            if state.snapshot.status == BrowseStatus::Loading {
                state.snapshot.status = BrowseStatus::Aborted;
                state.snapshot.finished_at = Some(Utc::now());
            }
        });
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(current) = self.current.get_mut().take() {
            current.handle.abort();
            current.task.abort();
        }
    }
}

/// Abort a Loader and wait until its task has stopped
async fn stop(current: Current) {
    let id = current.handle.id();
    current.handle.abort();
    current.task.abort();
    match current.task.await {
        Ok(()) => log::debug!("Browse {} had already settled", id),
        Err(e) if e.is_cancelled() => log::debug!("Browse {} aborted", id),
        Err(e) => log::warn!("Browse {} task failed: {:?}", id, e),
    }
}
