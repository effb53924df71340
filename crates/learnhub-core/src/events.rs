//! User-facing notifications and the login-required signal.
//!
//! The core never renders or navigates. It pushes `SessionEvent`s onto a
//! single channel; the presentation layer drains it, shows notices and
//! sends the user back to the login entry point on `LoginRequired`.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Notice(Notice),
    /// The credential was rejected; the user must authenticate again.
    LoginRequired,
}

/// Sending half of the event channel. Clone is cheap.
#[derive(Debug, Clone, Default)]
pub struct EventSender {
    tx: Option<UnboundedSender<SessionEvent>>,
}

impl EventSender {
    /// Create a connected sender/receiver pair
    pub fn channel() -> (Self, UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sender that drops every event (headless use)
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(SessionEvent::Notice(Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(SessionEvent::Notice(Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }));
    }

    pub fn login_required(&self) {
        self.send(SessionEvent::LoginRequired);
    }

    fn send(&self, event: SessionEvent) {
        if let Some(ref tx) = self.tx {
            if tx.send(event).is_err() {
                debug!("Event receiver dropped, discarding event");
            }
        }
    }
}

/// Drain every event currently queued on `rx` without waiting.
pub fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
