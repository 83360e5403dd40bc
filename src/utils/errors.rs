use thiserror::Error;

/// Errors raised by a single paged query against the endpoint
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Endpoint returned HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Failed to build request: {0}")]
    Request(String),
}

impl QueryError {
    /// HTTP status of a transport failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Implement From<serde_json::Error> for QueryError
impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Protocol(format!("bad JSON response from server: {}", err))
    }
}

/// Errors that can occur while browsing a resource
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Consistency violation: {0}")]
    Consistency(String),

    #[error("Browse aborted")]
    Aborted,

    #[error("Invalid resource IRI: {0}")]
    InvalidResource(String),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Unsupported serialization format: {0}")]
    UnsupportedFormat(String),

    #[error("No completed browse available")]
    NotReady,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Task failed: {0}")]
    Task(String),
}

/// Implement From<tokio::task::JoinError> for BrowseError
impl From<tokio::task::JoinError> for BrowseError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            BrowseError::Aborted
        } else {
            BrowseError::Task(err.to_string())
        }
    }
}

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("pipeline_depth must be 1 or 2, got {0}")]
    PipelineDepth(usize),

    #[error("Invalid endpoint URL '{url}': {reason}")]
    Endpoint { url: String, reason: String },

    #[error("Invalid sort rule '{rule}': {reason}")]
    SortRule { rule: String, reason: String },
}

/// Result type for browse operations
pub type BrowseResult<T> = Result<T, BrowseError>;
