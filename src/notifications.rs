use std::time::{
    Duration,
    Instant,
};

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub duration: Duration,
    pub shown_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.duration
    }
}

/// Transient messages for the user. Expiry is driven by the caller's clock
/// so the UI can sweep once per frame.
#[derive(Debug, Clone)]
pub struct Notifications {
    items: Vec<Notification>,
    default_duration: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}

impl Notifications {
    pub fn new(default_duration: Duration) -> Self {
        Self { items: Vec::new(), default_duration }
    }

    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>, duration: Duration) -> String {
        self.show_at(kind, message, duration, Instant::now())
    }

    pub fn show_at(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        duration: Duration,
        now: Instant,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.items.push(Notification {
            id: id.clone(),
            message: message.into(),
            kind,
            duration,
            shown_at: now,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> String {
        self.show(NotificationKind::Success, message, self.default_duration)
    }

    pub fn error(&mut self, message: impl Into<String>) -> String {
        self.show(NotificationKind::Error, message, self.default_duration)
    }

    pub fn info(&mut self, message: impl Into<String>) -> String {
        self.show(NotificationKind::Info, message, self.default_duration)
    }

    pub fn dismiss(&mut self, id: &str) {
        self.items.retain(|n| n.id != id);
    }

    pub fn expire(&mut self, now: Instant) {
        self.items.retain(|n| !n.is_expired(now));
    }

    pub fn active(&self, now: Instant) -> Vec<&Notification> {
        self.items.iter().filter(|n| !n.is_expired(now)).collect()
    }

    pub fn all(&self) -> &[Notification] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
