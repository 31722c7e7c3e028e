//! Status reporting surface consumed by the presentation layer.
//!
//! A single-slot channel: every write overwrites the unread value, and the
//! one consumer (whatever owns presentation) observes the latest snapshot.
//! Delivery never fails from the writer's point of view; if the consumer is
//! gone the write is silently dropped, not queued.

use serde::Serialize;
use tokio::sync::watch;

/// A point-in-time view of what the core is doing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Current status line (empty when idle).
    pub text: String,
    /// Current progress percentage, when an operation reports one.
    pub progress: Option<u8>,
}

/// Writer half of the status channel. Cheap to clone; any task may write.
#[derive(Debug, Clone)]
pub struct StatusSink {
    tx: watch::Sender<StatusSnapshot>,
}

impl StatusSink {
    /// Create the sink together with the consumer's receiver.
    pub fn new() -> (Self, watch::Receiver<StatusSnapshot>) {
        let (tx, rx) = watch::channel(StatusSnapshot::default());
        (Self { tx }, rx)
    }

    /// Replace the status line and drop any stale progress value.
    pub fn set_text(&self, text: impl Into<String>) {
        self.tx.send_modify(|s| {
            s.text = text.into();
            s.progress = None;
        });
    }

    /// Update the progress percentage, keeping the current line.
    pub fn set_progress(&self, pct: u8) {
        self.tx.send_modify(|s| s.progress = Some(pct.min(100)));
    }

    /// Reset to the idle snapshot.
    pub fn clear(&self) {
        self.tx.send_replace(StatusSnapshot::default());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn receiver_sees_latest_write() {
        let (sink, rx) = StatusSink::new();
        sink.set_text("Checking for updates…");
        sink.set_progress(40);

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.text, "Checking for updates…");
        assert_eq!(snapshot.progress, Some(40));
    }

    #[test]
    fn overwrites_collapse_to_the_newest_value() {
        let (sink, mut rx) = StatusSink::new();
        sink.set_text("first");
        sink.set_text("second");
        sink.set_text("third");

        // A slow consumer only ever observes the newest snapshot.
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.text, "third");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn new_text_clears_stale_progress() {
        let (sink, rx) = StatusSink::new();
        sink.set_progress(80);
        sink.set_text("Launching updater…");
        assert_eq!(rx.borrow().progress, None);
    }

    #[test]
    fn progress_is_clamped_to_100() {
        let (sink, rx) = StatusSink::new();
        sink.set_progress(250);
        assert_eq!(rx.borrow().progress, Some(100));
    }

    #[test]
    fn writes_after_consumer_drop_are_swallowed() {
        let (sink, rx) = StatusSink::new();
        drop(rx);

        // Must not panic or report an error.
        sink.set_text("nobody is listening");
        sink.set_progress(10);
        sink.clear();
    }

    #[test]
    fn clear_resets_to_idle() {
        let (sink, rx) = StatusSink::new();
        sink.set_text("working");
        sink.set_progress(5);
        sink.clear();
        assert_eq!(*rx.borrow(), StatusSnapshot::default());
    }
}
