//! Multi-recipient notification fanout for lifecycle events.
//!
//! # Responsibility
//! - Resolve each lifecycle event to its recipient set and notification
//!   kinds.
//! - Persist the whole batch in one best-effort insert.
//!
//! # Invariants
//! - Recipients are de-duplicated by account id before insertion; the first
//!   resolution wins, and the affected student is always resolved first.
//! - Callers invoke `fanout` only through the best-effort executor; a fanout
//!   failure never aborts the triggering operation.

use crate::model::activity::Activity;
use crate::model::application::{Application, ApplicationStatus};
use crate::model::notification::{Notification, NotificationKind};
use crate::model::user::{Role, UserId};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use std::collections::BTreeSet;

/// Lifecycle events that produce notifications.
#[derive(Debug, Clone, Copy)]
pub enum LifecycleEvent<'a> {
    ActivityCreated {
        activity: &'a Activity,
    },
    ApplicationSubmitted {
        application: &'a Application,
        activity: &'a Activity,
    },
    /// `application.status` carries the decision outcome.
    ApplicationDecided {
        application: &'a Application,
        activity: &'a Activity,
    },
}

/// Builds and persists one notification batch per lifecycle event.
pub struct NotificationFanout<NR, UR> {
    notifications: NR,
    users: UR,
}

impl<NR: NotificationRepository, UR: UserRepository> NotificationFanout<NR, UR> {
    pub fn new(notifications: NR, users: UR) -> Self {
        Self {
            notifications,
            users,
        }
    }

    /// Resolves recipients and inserts the batch; returns the row count.
    pub fn fanout(&self, event: &LifecycleEvent<'_>) -> RepoResult<usize> {
        let batch = self.resolve(event)?;
        self.notifications.insert_batch(&batch)
    }

    fn resolve(&self, event: &LifecycleEvent<'_>) -> RepoResult<Vec<Notification>> {
        let mut batch = Batch::default();

        match event {
            LifecycleEvent::ActivityCreated { activity } => {
                let body = format!("New activity published: {}", activity.title);
                for student in self.users.list_by_role(Role::Student, true)? {
                    batch.push(student.uuid, NotificationKind::Announcement, &body);
                }
            }
            LifecycleEvent::ApplicationSubmitted {
                application,
                activity,
            } => {
                batch.push(
                    application.student_uuid,
                    NotificationKind::Announcement,
                    &format!("Your application for `{}` was received", activity.title),
                );
                let staff_body =
                    format!("New application for `{}` awaits review", activity.title);
                batch.push(activity.owner_uuid, NotificationKind::Reminder, &staff_body);
                for admin in self.users.list_by_role(Role::Admin, true)? {
                    batch.push(admin.uuid, NotificationKind::Reminder, &staff_body);
                }
            }
            LifecycleEvent::ApplicationDecided {
                application,
                activity,
            } => {
                let (kind, verb) = decision_wording(application.status);
                batch.push(
                    application.student_uuid,
                    kind,
                    &format!("Your application for `{}` was {verb}", activity.title),
                );
                let staff_body =
                    format!("Application for `{}` was {verb}", activity.title);
                batch.push(activity.owner_uuid, kind, &staff_body);
                for admin in self.users.list_by_role(Role::Admin, true)? {
                    batch.push(admin.uuid, kind, &staff_body);
                }
            }
        }

        Ok(batch.into_notifications())
    }
}

fn decision_wording(status: ApplicationStatus) -> (NotificationKind, &'static str) {
    match status {
        ApplicationStatus::Approved => (NotificationKind::Approval, "approved"),
        ApplicationStatus::Rejected => (NotificationKind::Rejection, "rejected"),
        ApplicationStatus::Pending => (NotificationKind::Reminder, "moved back to review"),
    }
}

/// Insertion-ordered batch with first-wins recipient de-duplication.
#[derive(Default)]
struct Batch {
    seen: BTreeSet<UserId>,
    notifications: Vec<Notification>,
}

impl Batch {
    fn push(&mut self, recipient: UserId, kind: NotificationKind, body: &str) {
        if self.seen.insert(recipient) {
            self.notifications
                .push(Notification::new(recipient, kind, body));
        }
    }

    fn into_notifications(self) -> Vec<Notification> {
        self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::Batch;
    use crate::model::notification::NotificationKind;
    use uuid::Uuid;

    #[test]
    fn batch_deduplicates_by_recipient_first_wins() {
        let recipient = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut batch = Batch::default();

        batch.push(recipient, NotificationKind::Approval, "for the student");
        batch.push(recipient, NotificationKind::Reminder, "staff copy");
        batch.push(other, NotificationKind::Reminder, "staff copy");

        let notifications = batch.into_notifications();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].recipient_uuid, recipient);
        assert_eq!(notifications[0].kind, NotificationKind::Approval);
        assert_eq!(notifications[1].recipient_uuid, other);
    }
}
