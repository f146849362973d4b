//! Notification record types

use serde::{Deserialize, Serialize};

/// Visual/semantic classification of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A transient user-facing message
///
/// Owned exclusively by the [`NotificationStore`](super::NotificationStore);
/// ids are monotonic so generation order is always recoverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique, monotonically increasing id
    pub id: u64,
    /// Classification driving the visual treatment
    pub kind: NotificationKind,
    /// Short heading
    pub title: String,
    /// Body text
    pub message: String,
    /// ISO 8601 creation timestamp
    pub created_at: String,
}

impl Notification {
    /// Create a notification with the current timestamp
    pub fn new(
        id: u64,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
