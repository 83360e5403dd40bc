//! Presentation order of predicate rows

use regex::Regex;
use std::cmp::Ordering;

use crate::rdf::PrefixMap;
use crate::utils::ConfigError;

/// Ranks predicates by the first rule matching their terse form
#[derive(Debug, Clone, Default)]
pub struct PredicateRanker {
    rules: Vec<Regex>,
}

impl PredicateRanker {
    pub fn new<S: AsRef<str>>(rules: &[S]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(rule.as_ref()).map_err(|e| ConfigError::SortRule {
                    rule: rule.as_ref().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Index of the first matching rule; unmatched ranks after every rule
    pub fn rank(&self, terse: &str) -> usize {
        self.rules
            .iter()
            .position(|rule| rule.is_match(terse))
            .unwrap_or(self.rules.len())
    }
}

/// Row order of one channel: `(rank, predicate IRI)` ascending
#[derive(Debug, Default)]
pub struct RowOrder {
    rows: Vec<(usize, String)>,
}

impl RowOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a new predicate and return its position
    pub fn insert(&mut self, ranker: &PredicateRanker, prefixes: &PrefixMap, predicate: &str) -> usize {
        let key = (ranker.rank(&prefixes.terse(predicate)), predicate.to_string());
        let position = self
            .rows
            .partition_point(|existing| compare(existing, &key) == Ordering::Less);
        self.rows.insert(position, key);
        position
    }

    pub fn predicates(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(_, predicate)| predicate.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn compare(a: &(usize, String), b: &(usize, String)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1))
}
