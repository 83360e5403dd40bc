//! Shared configuration constants for SPARQL browsing
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Media type of SPARQL SELECT results in JSON
pub const MIME_SPARQL_RESULTS: &str = "application/sparql-results+json";

/// Form-encoded request body (`query=...`)
pub const MIME_FORM: &str = "application/x-www-form-urlencoded";

/// Raw query text request body
pub const MIME_TEXT: &str = "text/plain;charset=UTF-8";

/// Rows requested per page
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 7;

/// Page requests kept in flight per channel (current page plus one pre-fetch)
pub const DEFAULT_PIPELINE_DEPTH: usize = 2;

/// Upper bound on `pipeline_depth`
pub const MAX_PIPELINE_DEPTH: usize = 2;

/// Header prepended to generated queries when no prefixes are configured
pub const QUERY_HEADER: &str = "## query generated by kodegen-sparql ##\n\n";

pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// Prefixes known out of the box
pub const INTERNAL_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("geosparql", "http://www.opengis.net/ont/geosparql#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
];
