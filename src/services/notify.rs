use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// One toast-worthy outcome. `field` is set for the per-field entries fanned
/// out from a structured create rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub field: Option<String>,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            field: None,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            field: None,
            message: message.into(),
        }
    }

    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// Fans operation outcomes out to subscribed sinks (the toast layer's seam).
/// Subscribers are plain channels; one whose receiver was dropped is pruned
/// on the next dispatch, so a torn-down session stops hearing anything.
#[derive(Default)]
pub struct NotificationDispatcher {
    subscribers: Mutex<Vec<UnboundedSender<Notification>>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner()).push(tx);
        rx
    }

    pub fn dispatch(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => tracing::info!("{}", notification.message),
            NotificationLevel::Error => tracing::error!("{}", notification.message),
        }
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(notification.clone()).is_ok());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.dispatch(Notification::success(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.dispatch(Notification::error(message));
    }

    /// One notification per offending field; the caller follows up with its
    /// own summary notification.
    pub fn field_errors(&self, errors: &[FieldError]) {
        for err in errors {
            self.dispatch(Notification::field_error(
                err.field_name(),
                format!("{}: {}", err.field_name(), err.message),
            ));
        }
    }
}
