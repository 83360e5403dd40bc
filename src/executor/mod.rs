//! Paged query execution against a SPARQL endpoint
//!
//! The [`QueryExecutor`] trait is the seam between the paging engine and the
//! transport. [`HttpQueryExecutor`] is the production implementation; tests
//! substitute scripted executors.

mod http;

pub use http::HttpQueryExecutor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

use crate::rdf::Row;
use crate::utils::QueryError;
use crate::utils::constants::{MIME_FORM, MIME_TEXT};

/// How the query text travels in the POST body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryEncoding {
    /// `application/x-www-form-urlencoded` with a `query` field
    #[default]
    Form,
    /// Raw query text
    Text,
}

impl QueryEncoding {
    pub fn content_type(self) -> &'static str {
        match self {
            QueryEncoding::Form => MIME_FORM,
            QueryEncoding::Text => MIME_TEXT,
        }
    }
}

/// Encoding preference shared by every request of one browse
///
/// Starts at the configured encoding and only ever moves from form to text.
#[derive(Debug)]
pub struct EncodingPreference(AtomicU8);

impl EncodingPreference {
    pub fn new(encoding: QueryEncoding) -> Self {
        Self(AtomicU8::new(Self::encode(encoding)))
    }

    pub fn get(&self) -> QueryEncoding {
        match self.0.load(Ordering::Acquire) {
            0 => QueryEncoding::Form,
            _ => QueryEncoding::Text,
        }
    }

    /// Permanently prefer raw text; returns true if this call made the switch
    pub fn switch_to_text(&self) -> bool {
        self.0.swap(Self::encode(QueryEncoding::Text), Ordering::AcqRel) == 0
    }

    fn encode(encoding: QueryEncoding) -> u8 {
        match encoding {
            QueryEncoding::Form => 0,
            QueryEncoding::Text => 1,
        }
    }
}

impl Default for EncodingPreference {
    fn default() -> Self {
        Self::new(QueryEncoding::default())
    }
}

/// Issues one page of a query
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run `query` restricted to `limit` rows starting at `offset`.
    ///
    /// Resolves to no rows when the request never reached the endpoint or was
    /// cancelled.
    async fn execute(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        encoding: &EncodingPreference,
    ) -> Result<Vec<Row>, QueryError>;
}

/// Append the paging clause to a query
pub fn paged_query(query: &str, limit: usize, offset: usize) -> String {
    format!("{}\nLIMIT {} OFFSET {}", query.trim_end(), limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_clause_is_appended() {
        assert_eq!(
            paged_query("select * { ?s ?p ?o }\n", 128, 256),
            "select * { ?s ?p ?o }\nLIMIT 128 OFFSET 256"
        );
    }

    #[test]
    fn preference_switches_once() {
        let preference = EncodingPreference::new(QueryEncoding::Form);
        assert_eq!(preference.get(), QueryEncoding::Form);
        assert!(preference.switch_to_text());
        assert!(!preference.switch_to_text());
        assert_eq!(preference.get(), QueryEncoding::Text);
    }
}
