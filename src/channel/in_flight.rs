//! Outstanding page requests of one channel

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::AbortHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

/// Page requests dispatched but not yet settled, keyed by page index
#[derive(Debug, Default)]
pub struct InFlight {
    handles: Mutex<HashMap<usize, AbortHandle>>,
    cancel: CancellationToken,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a dispatched request; after `abort()` it is cancelled at once
    pub fn register(&self, index: usize, handle: AbortHandle) {
        if self.cancel.is_cancelled() {
            handle.abort();
            return;
        }
        self.handles.lock().insert(index, handle);
    }

    /// Forget a request whose response has been received
    pub fn settle(&self, index: usize) {
        self.handles.lock().remove(&index);
    }

    /// Cancel every outstanding request, leaving the channel usable
    pub fn cancel_outstanding(&self) {
        let drained: Vec<(usize, AbortHandle)> = self.handles.lock().drain().collect();
        for (index, handle) in drained {
            debug!(page = index, "Cancelling outstanding page request");
            handle.abort();
        }
    }

    /// Stop the channel: no response received after this point is merged
    pub fn abort(&self) {
        self.cancel.cancel();
        self.cancel_outstanding();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

/// Cloneable handle for aborting a running channel from elsewhere
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    in_flight: Arc<InFlight>,
}

impl ChannelHandle {
    pub(crate) fn new(in_flight: Arc<InFlight>) -> Self {
        Self { in_flight }
    }

    /// Cancel every in-flight request; idempotent
    pub fn abort(&self) {
        self.in_flight.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.in_flight.is_aborted()
    }

    /// Number of requests currently in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
