//! Typed notice bus for user-facing notifications.
//!
//! The bus is an explicit value owned by the composition root — no
//! module-level listener registry. Subscribers get a broadcast receiver
//! and unregister by dropping it. Delivery is fire-and-forget: `notify`
//! never blocks and a notice is silently dropped when nobody is listening.

use serde::Serialize;
use tokio::sync::broadcast;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Broadcast bus for [`Notice`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Notice>,
}

impl EventBus {
    /// Bus buffering up to `capacity` undelivered notices per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a subscriber. Dropping the receiver unregisters it.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn notify(&self, kind: NoticeKind, message: impl Into<String>) {
        let _ = self.tx.send(Notice {
            kind,
            message: message.into(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}
