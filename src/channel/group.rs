use crate::rdf::Term;
use crate::surface::RowHandle;
use crate::utils::{BrowseError, BrowseResult};

/// Accumulated values of one predicate within a channel
#[derive(Debug, Clone)]
pub struct PredicateGroup {
    predicate: String,
    row: RowHandle,
    terms: Vec<Term>,
    complete: bool,
}

impl PredicateGroup {
    pub fn new(predicate: impl Into<String>, row: RowHandle) -> Self {
        Self {
            predicate: predicate.into(),
            row,
            terms: Vec::new(),
            complete: false,
        }
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn row(&self) -> RowHandle {
        self.row
    }

    /// Values sorted by raw value string
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Insert at the sorted position and return that index.
    ///
    /// Equal values keep arrival order.
    pub fn insert(&mut self, term: Term) -> BrowseResult<usize> {
        if self.complete {
            return Err(BrowseError::Consistency(format!(
                "value {:?} arrived for already complete predicate {}",
                term.value(),
                self.predicate
            )));
        }
        let index = self
            .terms
            .partition_point(|existing| existing.value() <= term.value());
        self.terms.insert(index, term);
        Ok(index)
    }

    /// Seal the group; completing twice is a violation
    pub fn complete(&mut self) -> BrowseResult<()> {
        if self.complete {
            return Err(BrowseError::Consistency(format!(
                "predicate {} completed twice",
                self.predicate
            )));
        }
        self.complete = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(group: &PredicateGroup) -> Vec<&str> {
        group.terms().iter().map(Term::value).collect()
    }

    #[test]
    fn pages_merge_into_sorted_order() {
        let mut group = PredicateGroup::new("http://ex.org/p", RowHandle(0));
        for v in ["b", "d"] {
            group.insert(Term::literal(v)).unwrap();
        }
        assert_eq!(group.insert(Term::literal("a")).unwrap(), 0);
        assert_eq!(group.insert(Term::literal("c")).unwrap(), 2);
        assert_eq!(values(&group), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn arrival_order_does_not_matter() {
        let mut forward = PredicateGroup::new("p", RowHandle(0));
        let mut backward = PredicateGroup::new("p", RowHandle(1));
        for v in ["b", "d", "a", "c"] {
            forward.insert(Term::literal(v)).unwrap();
        }
        for v in ["a", "c", "b", "d"] {
            backward.insert(Term::literal(v)).unwrap();
        }
        assert_eq!(values(&forward), values(&backward));
    }

    #[test]
    fn complete_group_rejects_values_and_recompletion() {
        let mut group = PredicateGroup::new("p", RowHandle(0));
        group.insert(Term::literal("x")).unwrap();
        group.complete().unwrap();
        assert!(matches!(
            group.insert(Term::literal("y")),
            Err(BrowseError::Consistency(_))
        ));
        assert!(matches!(group.complete(), Err(BrowseError::Consistency(_))));
        assert_eq!(values(&group), vec!["x"]);
    }
}
