//! Chunked SPARQL resource browsing
//!
//! Browses one resource of a SPARQL endpoint in both directions at once: the
//! statements where it is the subject and those where it is the object. Each
//! direction is paged through a [`Channel`] that pipelines requests, merges
//! pages in order and reports every predicate's values as soon as they are
//! known to be complete.

pub mod channel;
pub mod executor;
pub mod loader;
pub mod plugins;
pub mod rdf;
pub mod serialize;
pub mod session;
pub mod surface;
mod utils;

#[cfg(test)]
mod test_support;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::executor::QueryEncoding;
use crate::rdf::PrefixMap;
use crate::utils::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_PIPELINE_DEPTH, INTERNAL_PREFIXES, MAX_PIPELINE_DEPTH,
};

pub use channel::{Channel, ChannelHandle, ChannelReport, CompletedRow, Direction};
pub use executor::{HttpQueryExecutor, QueryExecutor};
pub use loader::{BrowseContext, BrowseOutcome, Loader, LoaderHandle};
pub use plugins::{Plugin, PluginRegistry, RowEvent};
pub use rdf::{Binding, Term};
pub use serialize::{TripleSerializer, serializer_for};
pub use session::{BrowseStatus, Session, SessionSnapshot};
pub use surface::{RowHandle, RowSurface, StatusSink};
pub use utils::constants;
pub use utils::{BrowseError, BrowseResult, ConfigError, QueryError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SPARQL endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Rows requested per page
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Page requests kept in flight per channel
    #[serde(default = "default_pipeline_depth")]
    pub pipeline_depth: usize,

    /// Initial request body encoding
    #[serde(default)]
    pub encoding: QueryEncoding,

    /// Prefix to namespace IRI
    #[serde(default = "default_prefixes")]
    pub prefixes: BTreeMap<String, String>,

    /// Regexes over terse predicates; earlier rules sort first
    #[serde(default = "default_sort_order")]
    pub sort_order: Vec<String>,

    /// Preferred language for labels
    #[serde(default = "default_language")]
    pub language: String,

    /// Serialization MIME type used when none is requested
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Replaces the generated prefix declarations at the top of each query
    #[serde(default)]
    pub query_header: Option<String>,
}

fn default_endpoint() -> String {
    "https://dbpedia.org/sparql".to_string()
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_pipeline_depth() -> usize {
    DEFAULT_PIPELINE_DEPTH
}
fn default_prefixes() -> BTreeMap<String, String> {
    INTERNAL_PREFIXES
        .iter()
        .map(|(prefix, ns)| (prefix.to_string(), ns.to_string()))
        .collect()
}
fn default_sort_order() -> Vec<String> {
    ["^rdfs:label$", "^rdf:type$", "^rdfs:", "^owl:", "^rdf:"]
        .iter()
        .map(|rule| rule.to_string())
        .collect()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_format() -> String {
    "text/turtle".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            chunk_size: default_chunk_size(),
            pipeline_depth: default_pipeline_depth(),
            encoding: QueryEncoding::default(),
            prefixes: default_prefixes(),
            sort_order: default_sort_order(),
            language: default_language(),
            default_format: default_format(),
            query_header: None,
        }
    }
}

impl Config {
    /// Reject settings no browse could run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if !(1..=MAX_PIPELINE_DEPTH).contains(&self.pipeline_depth) {
            return Err(ConfigError::PipelineDepth(self.pipeline_depth));
        }

        let endpoint = url::Url::parse(&self.endpoint).map_err(|e| ConfigError::Endpoint {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Endpoint {
                url: self.endpoint.clone(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        channel::PredicateRanker::new(&self.sort_order).map(|_| ())
    }

    pub fn prefix_map(&self) -> PrefixMap {
        PrefixMap::new(self.prefixes.clone())
    }
}

/// Default config file location: `<config dir>/kodegen/sparql.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kodegen").join("sparql.yaml"))
}

/// Load config from `path`, else the default location, else defaults
pub fn load_yaml_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.exists()),
    };

    let config = match config_path {
        Some(config_path) => {
            let contents = fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&contents)?
        }
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "endpoint: http://localhost:3030/ds/query\nchunk_size: 64\nencoding: text\n",
        )
        .unwrap();
        assert_eq!(config.endpoint, "http://localhost:3030/ds/query");
        assert_eq!(config.chunk_size, 64);
        assert_eq!(config.encoding, QueryEncoding::Text);
        assert_eq!(config.pipeline_depth, 2);
        assert_eq!(config.language, "en");
        assert!(config.prefixes.contains_key("rdfs"));
        config.validate().unwrap();
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config = Config {
            chunk_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroChunkSize)));

        let config = Config {
            pipeline_depth: MAX_PIPELINE_DEPTH + 1,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PipelineDepth(3))));

        let config = Config {
            pipeline_depth: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PipelineDepth(0))));

        let config = Config {
            endpoint: "ftp://example.org/sparql".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Endpoint { .. })));

        let config = Config {
            sort_order: vec!["[".into()],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::SortRule { .. })));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("kodegen-sparql-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "language: de\nsort_order: ['^rdf:type$']").unwrap();

        let config = load_yaml_config(Some(&path)).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.language, "de");
        assert_eq!(config.sort_order, vec!["^rdf:type$"]);
    }
}
