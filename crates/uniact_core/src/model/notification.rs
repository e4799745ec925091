//! Notification domain model.
//!
//! # Responsibility
//! - Define the persisted notification row produced by lifecycle fanout.
//!
//! # Invariants
//! - Rows are created only by the fanout; afterwards only `is_read` changes.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for notifications.
pub type NotificationId = Uuid;

/// Kind of a delivered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Approval,
    Rejection,
    Announcement,
    Reminder,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approval => "approval",
            Self::Rejection => "rejection",
            Self::Announcement => "announcement",
            Self::Reminder => "reminder",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approval" => Some(Self::Approval),
            "rejection" => Some(Self::Rejection),
            "announcement" => Some(Self::Announcement),
            "reminder" => Some(Self::Reminder),
            _ => None,
        }
    }
}

/// One persisted notification for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub uuid: NotificationId,
    pub recipient_uuid: UserId,
    pub kind: NotificationKind,
    pub body: String,
    pub is_read: bool,
    /// Insert timestamp in epoch milliseconds, assigned by storage.
    pub created_at: i64,
}

impl Notification {
    /// Creates an unread notification; `created_at` is assigned on insert.
    pub fn new(recipient_uuid: UserId, kind: NotificationKind, body: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            recipient_uuid,
            kind,
            body: body.into(),
            is_read: false,
            created_at: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Notification, NotificationKind};
    use uuid::Uuid;

    #[test]
    fn new_notification_starts_unread() {
        let notification =
            Notification::new(Uuid::new_v4(), NotificationKind::Approval, "approved");
        assert!(!notification.is_read);
    }

    #[test]
    fn kind_codec_round_trips() {
        for kind in [
            NotificationKind::Approval,
            NotificationKind::Rejection,
            NotificationKind::Announcement,
            NotificationKind::Reminder,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("digest"), None);
    }
}
