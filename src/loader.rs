//! Two-direction browse of a single resource

use dashmap::DashSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::Config;
use crate::channel::{Channel, ChannelHandle, ChannelReport, Direction, PredicateRanker};
use crate::executor::{EncodingPreference, HttpQueryExecutor, QueryEncoding, QueryExecutor};
use crate::plugins::{Plugin, PluginRegistry};
use crate::rdf::PrefixMap;
use crate::surface::{NullSurface, RowSurface, StatusSink, TracingStatus};
use crate::utils::{BrowseError, BrowseResult};

/// Everything a browse needs, built once from a [`Config`]
pub struct BrowseContext {
    pub config: Arc<Config>,
    pub prefixes: PrefixMap,
    pub ranker: PredicateRanker,
    pub executor: Arc<dyn QueryExecutor>,
    pub plugins: PluginRegistry,
    pub surface: Arc<dyn RowSurface>,
    pub status: Arc<dyn StatusSink>,
}

impl BrowseContext {
    /// Validate `config` and pair it with an executor
    pub fn new(config: Config, executor: Arc<dyn QueryExecutor>) -> BrowseResult<Self> {
        config.validate()?;
        let prefixes = config.prefix_map();
        let ranker = PredicateRanker::new(&config.sort_order)?;
        Ok(Self {
            config: Arc::new(config),
            prefixes,
            ranker,
            executor,
            plugins: PluginRegistry::new(),
            surface: Arc::new(NullSurface::default()),
            status: Arc::new(TracingStatus),
        })
    }

    /// Context querying the configured endpoint over HTTP
    pub fn from_config(config: Config) -> BrowseResult<Self> {
        let executor = HttpQueryExecutor::new(config.endpoint.clone())?;
        Self::new(config, Arc::new(executor))
    }

    pub fn with_plugin(mut self, plugin: Plugin) -> BrowseResult<Self> {
        self.plugins.register(plugin)?;
        Ok(self)
    }

    pub fn with_surface(mut self, surface: Arc<dyn RowSurface>) -> Self {
        self.surface = surface;
        self
    }

    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Preamble for generated queries
    pub fn query_header(&self) -> String {
        match &self.config.query_header {
            Some(header) => header.clone(),
            None => self.prefixes.query_header(),
        }
    }
}

impl fmt::Debug for BrowseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowseContext")
            .field("config", &self.config)
            .field("prefixes", &self.prefixes)
            .field("plugins", &self.plugins.len())
            .finish_non_exhaustive()
    }
}

/// State both channels of one Loader share
#[derive(Debug)]
pub struct LoaderShared {
    pub id: Uuid,
    pub resource: String,
    /// Request body encoding; falls back to text for every later request
    pub encoding: EncodingPreference,
    /// Datatypes already reported as unmapped
    pub missing_datatypes: DashSet<String>,
    label: Mutex<Option<String>>,
}

impl LoaderShared {
    pub fn new(resource: impl Into<String>, encoding: QueryEncoding) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource: resource.into(),
            encoding: EncodingPreference::new(encoding),
            missing_datatypes: DashSet::new(),
            label: Mutex::new(None),
        }
    }

    pub fn label(&self) -> Option<String> {
        self.label.lock().clone()
    }

    pub(crate) fn set_label(&self, label: &str) {
        *self.label.lock() = Some(label.to_string());
    }
}

/// Result of a browse where both directions finished
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseOutcome {
    pub id: Uuid,
    pub resource: String,
    pub resource_terse: String,
    pub label: Option<String>,
    pub outgoing: ChannelReport,
    pub incoming: ChannelReport,
    pub missing_datatypes: BTreeSet<String>,
}

impl BrowseOutcome {
    pub fn report(&self, direction: Direction) -> &ChannelReport {
        match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        }
    }

    pub fn triples(&self) -> usize {
        self.outgoing.triples + self.incoming.triples
    }

    /// Display name: the resolved label, else the terse resource
    pub fn title(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.resource_terse)
    }
}

/// Aborts both channels of a Loader from anywhere
#[derive(Debug, Clone)]
pub struct LoaderHandle {
    id: Uuid,
    outgoing: ChannelHandle,
    incoming: ChannelHandle,
}

impl LoaderHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Abort both channels; idempotent
    pub fn abort(&self) {
        self.outgoing.abort();
        self.incoming.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.outgoing.is_aborted() && self.incoming.is_aborted()
    }

    pub fn in_flight(&self) -> usize {
        self.outgoing.in_flight() + self.incoming.in_flight()
    }
}

/// Loads the outgoing and incoming statements of one resource
pub struct Loader {
    ctx: Arc<BrowseContext>,
    shared: Arc<LoaderShared>,
    outgoing: Channel,
    incoming: Channel,
}

impl Loader {
    /// Prepare a browse; `resource` may be `<iri>`, `prefix:local` or a bare IRI
    pub fn new(resource: &str, ctx: Arc<BrowseContext>) -> BrowseResult<Self> {
        let resource = ctx.prefixes.resolve(resource);
        validate_resource(&resource)?;

        let shared = Arc::new(LoaderShared::new(resource, ctx.config.encoding));
        let outgoing = Channel::new(Direction::Outgoing, ctx.clone(), shared.clone());
        let incoming = Channel::new(Direction::Incoming, ctx.clone(), shared.clone());
        Ok(Self {
            ctx,
            shared,
            outgoing,
            incoming,
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn resource(&self) -> &str {
        &self.shared.resource
    }

    pub fn handle(&self) -> LoaderHandle {
        LoaderHandle {
            id: self.shared.id,
            outgoing: self.outgoing.handle(),
            incoming: self.incoming.handle(),
        }
    }

    /// Run both channels; resolves once both have finished
    pub async fn run(self) -> BrowseResult<BrowseOutcome> {
        let handle = self.handle();
        let Loader {
            ctx,
            shared,
            outgoing,
            incoming,
        } = self;
        info!(id = %shared.id, resource = %shared.resource, "Browsing resource");

        let (outgoing, incoming) = match tokio::try_join!(outgoing.run(), incoming.run()) {
            Ok(reports) => reports,
            Err(e) => {
                handle.abort();
                if !matches!(e, BrowseError::Aborted) {
                    warn!(id = %shared.id, "Browse failed: {}", e);
                }
                return Err(e);
            }
        };

        let outcome = BrowseOutcome {
            id: shared.id,
            resource_terse: ctx.prefixes.terse(&shared.resource),
            resource: shared.resource.clone(),
            label: shared.label(),
            outgoing,
            incoming,
            missing_datatypes: shared.missing_datatypes.iter().map(|d| d.key().clone()).collect(),
        };
        info!(
            id = %outcome.id,
            outgoing = outcome.outgoing.triples,
            incoming = outcome.incoming.triples,
            "Browse complete"
        );
        ctx.plugins.dispatch_resource(&outcome);
        Ok(outcome)
    }
}

/// An absolute IRI that can sit between `<` and `>` in a query
fn validate_resource(resource: &str) -> BrowseResult<()> {
    if let Some(bad) = resource
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\'))
    {
        return Err(BrowseError::InvalidResource(format!(
            "{:?} contains {:?}",
            resource, bad
        )));
    }
    url::Url::parse(resource)
        .map(|_| ())
        .map_err(|e| BrowseError::InvalidResource(format!("{:?}: {}", resource, e)))
}
