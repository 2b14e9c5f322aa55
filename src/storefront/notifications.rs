//! Toast notifications

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use serde::Serialize;
use uuid::Uuid;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Neutral information
    Info,

    /// An action succeeded
    Success,

    /// Something needs the user's attention
    Warning,

    /// An action failed
    Error,
}

/// One queued notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification id
    pub id: Uuid,

    /// Severity
    pub level: NotificationLevel,

    /// Text shown to the user
    pub message: String,

    /// When it was raised
    pub created_at: Timestamp,
}

/// Notifications waiting to be shown, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notifications {
    queue: Vec<Notification>,
    ttl: SignedDuration,
}

impl Notifications {
    /// Empty queue whose notifications live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            queue: Vec::new(),
            ttl: SignedDuration::try_from(ttl).unwrap_or(SignedDuration::MAX),
        }
    }

    /// Queue a notification and return its id.
    pub fn push(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now: Timestamp,
    ) -> Uuid {
        let id = Uuid::now_v7();

        self.queue.push(Notification {
            id,
            level,
            message: message.into(),
            created_at: now,
        });

        id
    }

    /// Dismiss one notification.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.queue.len();
        self.queue.retain(|notification| notification.id != id);

        self.queue.len() != before
    }

    /// Drop notifications that have been shown for their full lifetime. Returns how many went.
    pub fn expire(&mut self, now: Timestamp) -> usize {
        let before = self.queue.len();
        let ttl = self.ttl;

        self.queue
            .retain(|notification| now.duration_since(notification.created_at) < ttl);

        before - self.queue.len()
    }

    /// Queued notifications.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter()
    }

    /// Most recent notification.
    pub fn latest(&self) -> Option<&Notification> {
        self.queue.last()
    }

    /// Number queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
