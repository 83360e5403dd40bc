//! HTTP transport for paged SPARQL queries

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use std::fmt;
use tracing::{debug, warn};

use super::{EncodingPreference, QueryEncoding, QueryExecutor, paged_query};
use crate::rdf::{Row, parse_results};
use crate::utils::QueryError;
use crate::utils::constants::MIME_SPARQL_RESULTS;

/// What came back from one POST
enum Attempt {
    Rows(Vec<Row>),
    /// Request never produced an HTTP status (unreachable or cancelled)
    Unreachable(String),
    Status { status: u16, body: String },
}

/// Executes paged queries by POSTing to a SPARQL endpoint
#[derive(Clone)]
pub struct HttpQueryExecutor {
    client: Client,
    endpoint: String,
}

impl HttpQueryExecutor {
    /// Create an executor for the given endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Result<Self, QueryError> {
        let client = Client::builder()
            .build()
            .map_err(|e| QueryError::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Create an executor sharing an existing client
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn post(&self, query: &str, encoding: QueryEncoding) -> Result<Attempt, QueryError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, MIME_SPARQL_RESULTS)
            .header(CACHE_CONTROL, "no-cache, max-age=0")
            .header(CONTENT_TYPE, encoding.content_type());

        let request = match encoding {
            QueryEncoding::Form => {
                request.body(format!("query={}", urlencoding::encode(query)))
            }
            QueryEncoding::Text => request.body(query.to_owned()),
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => return Err(QueryError::Request(e.to_string())),
            Err(e) => return Ok(Attempt::Unreachable(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with(MIME_SPARQL_RESULTS) {
            return Err(QueryError::Protocol(format!(
                "bad content type: '{}'",
                content_type
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Protocol(format!("Failed to read response body: {}", e)))?;

        Ok(Attempt::Rows(parse_results(&body)?))
    }
}

impl fmt::Debug for HttpQueryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpQueryExecutor")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl QueryExecutor for HttpQueryExecutor {
    async fn execute(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        encoding: &EncodingPreference,
    ) -> Result<Vec<Row>, QueryError> {
        let query = paged_query(query, limit, offset);
        let preferred = encoding.get();

        match self.post(&query, preferred).await? {
            Attempt::Rows(rows) => Ok(rows),
            Attempt::Unreachable(reason) => {
                warn!(offset, "No HTTP status from endpoint ({}); treating as no data", reason);
                Ok(Vec::new())
            }
            Attempt::Status { status, .. }
                if (400..500).contains(&status) && preferred == QueryEncoding::Form =>
            {
                if encoding.switch_to_text() {
                    debug!(status, "Endpoint rejected form-encoded query, switching to raw text");
                }
                match self.post(&query, QueryEncoding::Text).await? {
                    Attempt::Rows(rows) => Ok(rows),
                    Attempt::Unreachable(reason) => {
                        warn!(offset, "No HTTP status from endpoint ({}); treating as no data", reason);
                        Ok(Vec::new())
                    }
                    Attempt::Status { status, body } => Err(QueryError::Transport { status, body }),
                }
            }
            Attempt::Status { status, body } => Err(QueryError::Transport { status, body }),
        }
    }
}
