//! Progress reporting.
//!
//! Long-running stages report into a [`ProgressSink`] rather than calling
//! back into any particular presentation layer.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Cumulative progress of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Items fully finished
    pub completed: usize,
    /// Items in the batch
    pub total: usize,
    /// `floor(completed / total * 100)`
    pub percent: u8,
}

impl ProgressUpdate {
    pub fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (completed.min(total) * 100 / total) as u8
        };
        Self {
            completed,
            total,
            percent,
        }
    }

    /// Zero progress for a batch of `total`.
    pub fn start(total: usize) -> Self {
        Self::new(0, total)
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }

    /// Counter text, e.g. `2 of 5`.
    pub fn counter_label(&self) -> String {
        format!("{} of {}", self.completed, self.total)
    }
}

impl std::fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}% ({})", self.percent, self.counter_label())
    }
}

/// Receiver of progress updates.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

impl ProgressSink for mpsc::UnboundedSender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        // A dropped receiver just means nobody is watching.
        let _ = self.send(update);
    }
}

/// Sink that records every update in order.
#[derive(Debug, Default)]
pub struct ProgressLog {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all updates received so far.
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<ProgressUpdate> {
        self.updates.lock().ok().and_then(|u| u.last().copied())
    }
}

impl ProgressSink for ProgressLog {
    fn report(&self, update: ProgressUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_uses_floor() {
        assert_eq!(ProgressUpdate::new(1, 3).percent, 33);
        assert_eq!(ProgressUpdate::new(2, 3).percent, 66);
        assert_eq!(ProgressUpdate::new(3, 3).percent, 100);
        assert_eq!(ProgressUpdate::new(0, 0).percent, 0);
    }

    #[test]
    fn test_counter_label() {
        let update = ProgressUpdate::new(1, 3);
        assert_eq!(update.counter_label(), "1 of 3");
        assert_eq!(update.to_string(), "33% (1 of 3)");
        assert!(!update.is_complete());
        assert!(ProgressUpdate::new(3, 3).is_complete());
    }

    #[test]
    fn test_progress_log_records_in_order() {
        let log = ProgressLog::new();
        log.report(ProgressUpdate::new(1, 2));
        log.report(ProgressUpdate::new(2, 2));

        let updates = log.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(log.last(), Some(ProgressUpdate::new(2, 2)));
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.report(ProgressUpdate::new(1, 4));
        assert_eq!(rx.recv().await, Some(ProgressUpdate::new(1, 4)));

        // Closed receiver is not an error for the sender side.
        drop(rx);
        tx.report(ProgressUpdate::new(2, 4));
    }
}
