//! Notification repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist fanout batches and expose per-recipient reads.
//!
//! # Invariants
//! - A batch insert is one transaction: all rows land or none do.
//! - Only `is_read` is ever updated after insert.

use crate::model::notification::{Notification, NotificationId, NotificationKind};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, int_to_bool, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    uuid,
    recipient_uuid,
    kind,
    body,
    is_read,
    created_at
FROM notifications";

/// Repository interface for persisted notifications.
pub trait NotificationRepository {
    /// Inserts the batch atomically; returns the number of rows written.
    fn insert_batch(&self, notifications: &[Notification]) -> RepoResult<usize>;
    fn list_for_recipient(
        &self,
        recipient_uuid: UserId,
        unread_only: bool,
    ) -> RepoResult<Vec<Notification>>;
    fn mark_read(&self, uuid: NotificationId) -> RepoResult<()>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn insert_batch(&self, notifications: &[Notification]) -> RepoResult<usize> {
        if notifications.is_empty() {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for notification in notifications {
            tx.execute(
                "INSERT INTO notifications (uuid, recipient_uuid, kind, body, is_read)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    notification.uuid.to_string(),
                    notification.recipient_uuid.to_string(),
                    notification.kind.as_str(),
                    notification.body.as_str(),
                    bool_to_int(notification.is_read),
                ],
            )?;
        }
        tx.commit()?;
        Ok(notifications.len())
    }

    fn list_for_recipient(
        &self,
        recipient_uuid: UserId,
        unread_only: bool,
    ) -> RepoResult<Vec<Notification>> {
        let mut sql = format!("{NOTIFICATION_SELECT_SQL} WHERE recipient_uuid = ?1");
        if unread_only {
            sql.push_str(" AND is_read = 0");
        }
        sql.push_str(" ORDER BY created_at DESC, uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([recipient_uuid.to_string()])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn mark_read(&self, uuid: NotificationId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE uuid = ?1;",
            [uuid.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "notifications",
                uuid,
            });
        }
        Ok(())
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let uuid_text: String = row.get("uuid")?;
    let recipient_text: String = row.get("recipient_uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = NotificationKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in notifications.kind"))
    })?;

    Ok(Notification {
        uuid: parse_uuid(&uuid_text, "notifications.uuid")?,
        recipient_uuid: parse_uuid(&recipient_text, "notifications.recipient_uuid")?,
        kind,
        body: row.get("body")?,
        is_read: int_to_bool(row.get("is_read")?, "notifications.is_read")?,
        created_at: row.get("created_at")?,
    })
}
