//! Progress reporting abstraction.
//!
//! The orchestrator emits ordered, monotonically increasing events to an
//! injected sink. No analyzer logic depends on whether a sink is attached;
//! a run with [`NullSink`] behaves identically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One progress step notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Step name, e.g. `"Sales: usage"`
    pub step: String,

    /// Completed steps so far (monotonically increasing per run)
    pub current: u64,

    /// Total steps in this run
    pub total: u64,

    /// `current / total` in percent
    pub percent: f64,
}

/// Consumer of progress events.
pub trait ProgressSink: Send + Sync {
    /// Receive one event. Implementations must not block.
    fn report(&self, event: ProgressEvent);
}

/// Sink that discards everything; the default when no consumer subscribed.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _event: ProgressEvent) {}
}

/// Sink forwarding events into an unbounded channel, for remote consumers
/// and tests.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Create a sink and its receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, event: ProgressEvent) {
        // A hung-up receiver is not the orchestrator's problem.
        let _ = self.tx.send(event);
    }
}

/// Shared per-run step counter guaranteeing ordered, monotonic events even
/// when steps complete concurrently.
#[derive(Clone)]
pub(crate) struct ProgressTracker {
    sink: Arc<dyn ProgressSink>,
    current: Arc<AtomicU64>,
    total: u64,
}

impl ProgressTracker {
    pub(crate) fn new(sink: Arc<dyn ProgressSink>, total: u64) -> Self {
        Self {
            sink,
            current: Arc::new(AtomicU64::new(0)),
            total,
        }
    }

    /// Record one completed step and emit its event.
    pub(crate) fn step(&self, name: impl Into<String>) {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.max(current);
        self.sink.report(ProgressEvent {
            step: name.into(),
            current,
            total,
            percent: (current as f64 / total as f64) * 100.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_is_monotonic() {
        let (sink, mut rx) = ChannelSink::new();
        let tracker = ProgressTracker::new(Arc::new(sink), 3);

        tracker.step("schema");
        tracker.step("profile");
        tracker.step("usage");

        let mut last = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(event.current > last);
            last = event.current;
            assert_eq!(event.total, 3);
        }
        assert_eq!(last, 3);
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let tracker = ProgressTracker::new(Arc::new(NullSink), 1);
        tracker.step("schema");
        tracker.step("beyond total"); // total clamps up rather than panicking
    }
}
