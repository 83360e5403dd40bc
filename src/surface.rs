//! Collaborator interfaces for presenting results while they load
//!
//! Rendering is not done here. A [`RowSurface`] is told where a predicate row
//! belongs and where each value lands inside it; a [`StatusSink`] receives the
//! progress strings of each channel.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::channel::Direction;
use crate::rdf::Term;

/// Opaque handle to a predicate row created by a [`RowSurface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHandle(pub u64);

/// Receives live row and value placement
pub trait RowSurface: Send + Sync {
    /// A new predicate row appears at `position` among the channel's rows
    fn open_row(&self, direction: Direction, predicate: &str, position: usize) -> RowHandle;

    /// `term` was inserted at `index` within the row's sorted values
    fn insert_value(&self, row: RowHandle, index: usize, term: &Term);
}

/// Receives free-text progress updates
pub trait StatusSink: Send + Sync {
    fn update(&self, direction: Direction, text: &str);
}

/// Surface that only hands out row handles
#[derive(Debug, Default)]
pub struct NullSurface {
    next: AtomicU64,
}

impl RowSurface for NullSurface {
    fn open_row(&self, _direction: Direction, _predicate: &str, _position: usize) -> RowHandle {
        RowHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }

    fn insert_value(&self, _row: RowHandle, _index: usize, _term: &Term) {}
}

/// Status sink that writes progress to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn update(&self, direction: Direction, text: &str) {
        info!(channel = %direction, "{}", text);
    }
}
