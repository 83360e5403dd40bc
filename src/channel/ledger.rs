//! Per-page ledger backing predicate completeness decisions
//!
//! Rows inside a page are sorted by predicate, so only a page's first and last
//! predicate can continue across a page boundary. Each processed page records
//! those two predicates and whether it is terminal. A predicate is complete
//! once both ends of its run of pages are closed:
//!
//! - walking backwards, every page is processed until one is reached where the
//!   predicate is not the last one, or where it starts (the page is not mono);
//! - walking forwards, every page is processed until a terminal page, or one
//!   whose first predicate differs, or where the predicate stops.
//!
//! An unprocessed page anywhere on either walk defers the decision.

use std::collections::BTreeMap;

use crate::utils::{BrowseError, BrowseResult};

/// Summary of one processed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// First predicate; `None` for an empty page
    pub first: Option<String>,
    /// Last predicate; `None` for an empty page
    pub last: Option<String>,
    /// No page follows this one
    pub terminal: bool,
}

impl PageEntry {
    pub fn new(first: impl Into<String>, last: impl Into<String>, terminal: bool) -> Self {
        Self {
            first: Some(first.into()),
            last: Some(last.into()),
            terminal,
        }
    }

    /// Empty page; always terminal
    pub fn empty() -> Self {
        Self {
            first: None,
            last: None,
            terminal: true,
        }
    }

    /// Every row of the page shares one predicate
    pub fn is_mono(&self) -> bool {
        self.first.is_some() && self.first == self.last
    }

    fn starts_with(&self, predicate: &str) -> bool {
        self.first.as_deref() == Some(predicate)
    }

    fn ends_with(&self, predicate: &str) -> bool {
        self.last.as_deref() == Some(predicate)
    }
}

/// Page index to entry, for one channel
#[derive(Debug, Default)]
pub struct PageLedger {
    pages: BTreeMap<usize, PageEntry>,
}

impl PageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed page. Each page index is recorded once.
    pub fn record(&mut self, index: usize, entry: PageEntry) -> BrowseResult<()> {
        if self.pages.contains_key(&index) {
            return Err(BrowseError::Consistency(format!(
                "page {} processed twice",
                index
            )));
        }
        self.pages.insert(index, entry);
        Ok(())
    }

    /// No value of `predicate` can precede page `index` unmerged
    pub fn closed_before(&self, index: usize, predicate: &str) -> bool {
        let mut cursor = index;
        while cursor > 0 {
            cursor -= 1;
            let Some(entry) = self.pages.get(&cursor) else {
                return false;
            };
            if !entry.ends_with(predicate) || !entry.is_mono() {
                return true;
            }
        }
        true
    }

    /// No value of `predicate` can follow page `index`
    pub fn closed_after(&self, index: usize, predicate: &str) -> bool {
        let mut cursor = index;
        loop {
            let Some(entry) = self.pages.get(&cursor) else {
                return false;
            };
            if entry.terminal {
                return true;
            }
            cursor += 1;
            let Some(next) = self.pages.get(&cursor) else {
                return false;
            };
            if !next.starts_with(predicate) || !next.is_mono() {
                return true;
            }
        }
    }

    /// Whether `predicate`, seen on page `index`, has all of its values merged
    pub fn is_complete(&self, index: usize, predicate: &str) -> bool {
        let Some(entry) = self.pages.get(&index) else {
            return false;
        };
        let left = !entry.starts_with(predicate) || self.closed_before(index, predicate);
        let right = !entry.ends_with(predicate) || self.closed_after(index, predicate);
        left && right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_and_bounded_predicates_of_first_page() {
        let mut ledger = PageLedger::new();
        ledger.record(0, PageEntry::new("a", "c", false)).unwrap();

        assert!(ledger.is_complete(0, "a"));
        assert!(ledger.is_complete(0, "b"));
        assert!(!ledger.is_complete(0, "c"));

        ledger.record(1, PageEntry::new("d", "d", true)).unwrap();
        assert!(ledger.is_complete(0, "c"));
        assert!(ledger.is_complete(1, "d"));
    }

    #[test]
    fn mono_first_page_is_deferred() {
        let mut ledger = PageLedger::new();
        ledger.record(0, PageEntry::new("p1", "p1", false)).unwrap();
        assert!(!ledger.is_complete(0, "p1"));

        ledger.record(1, PageEntry::new("p1", "p2", false)).unwrap();
        assert!(ledger.is_complete(0, "p1"));
        assert!(ledger.is_complete(1, "p1"));
        assert!(!ledger.is_complete(1, "p2"));

        ledger.record(2, PageEntry::new("p2", "p2", true)).unwrap();
        assert!(ledger.is_complete(2, "p2"));
        assert!(ledger.is_complete(1, "p2"));
    }

    #[test]
    fn run_of_mono_pages_needs_both_ends() {
        let mut ledger = PageLedger::new();
        ledger.record(0, PageEntry::new("a", "p", false)).unwrap();
        ledger.record(2, PageEntry::new("p", "p", false)).unwrap();
        ledger.record(3, PageEntry::new("p", "z", false)).unwrap();

        // page 1 still missing: both walks through it must defer
        assert!(!ledger.is_complete(2, "p"));
        assert!(!ledger.is_complete(0, "p"));

        ledger.record(1, PageEntry::new("p", "p", false)).unwrap();
        assert!(ledger.is_complete(0, "p"));
        assert!(ledger.is_complete(1, "p"));
        assert!(ledger.is_complete(3, "p"));
        assert!(!ledger.is_complete(3, "z"));
    }

    #[test]
    fn empty_page_closes_previous_tail() {
        let mut ledger = PageLedger::new();
        ledger.record(0, PageEntry::new("a", "b", false)).unwrap();
        assert!(!ledger.is_complete(0, "b"));
        ledger.record(1, PageEntry::empty()).unwrap();
        assert!(ledger.is_complete(0, "b"));
    }

    #[test]
    fn terminal_mono_page_closes_after_left_is_known() {
        let mut ledger = PageLedger::new();
        ledger.record(1, PageEntry::new("p", "p", true)).unwrap();
        assert!(!ledger.is_complete(1, "p"));
        ledger.record(0, PageEntry::new("a", "b", false)).unwrap();
        assert!(ledger.is_complete(1, "p"));
        assert!(ledger.is_complete(0, "b"));
    }

    #[test]
    fn recording_a_page_twice_is_a_violation() {
        let mut ledger = PageLedger::new();
        ledger.record(0, PageEntry::empty()).unwrap();
        assert!(matches!(
            ledger.record(0, PageEntry::empty()),
            Err(BrowseError::Consistency(_))
        ));
    }
}
