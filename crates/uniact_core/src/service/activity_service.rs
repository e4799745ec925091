//! Activity lifecycle use-case service.
//!
//! # Responsibility
//! - Create, patch and delete activities under the declared access policy.
//! - Trigger the fanout/audit side effects after the primary mutation.
//!
//! # Invariants
//! - `enrolled` is never written by this service; the enrollment ledger owns
//!   it.
//! - The cascading delete is blocked for non-admins while pending
//!   applications exist, and commits all-or-nothing.

use crate::auth::AccessRequirement;
use crate::model::activity::{Activity, ActivityCategory, ActivityId, ActivityStatus};
use crate::model::audit::{actions, AuditEntry};
use crate::model::user::{Role, User};
use crate::model::ValidationError;
use crate::repo::activity_repo::{ActivityListQuery, ActivityRepository, CascadeSummary};
use crate::repo::application_repo::ApplicationRepository;
use crate::repo::audit_repo::AuditRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::audit_recorder::AuditRecorder;
use crate::service::notification_fanout::{LifecycleEvent, NotificationFanout};
use crate::service::side_effect::run_best_effort;
use crate::service::{ServiceError, ServiceResult};
use chrono::DateTime;

const CREATE_ACCESS: AccessRequirement = AccessRequirement::for_roles(&[Role::Coordinator]);
const MANAGE_ACCESS: AccessRequirement = AccessRequirement::for_roles(&[Role::Coordinator]);

/// Request model for creating an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDraft {
    pub title: String,
    pub description: String,
    /// Category name, validated against the fixed enumeration.
    pub category: String,
    pub location: Option<String>,
    /// Scheduled start as an RFC 3339 timestamp.
    pub starts_at: String,
    pub capacity: i64,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<String>,
    pub capacity: Option<i64>,
    pub status: Option<String>,
}

/// Use-case service for the activity lifecycle.
pub struct ActivityService<VR, AR, NR, UR, LR> {
    activities: VR,
    applications: AR,
    fanout: NotificationFanout<NR, UR>,
    audit: AuditRecorder<LR>,
}

impl<VR, AR, NR, UR, LR> ActivityService<VR, AR, NR, UR, LR>
where
    VR: ActivityRepository,
    AR: ApplicationRepository,
    NR: NotificationRepository,
    UR: UserRepository,
    LR: AuditRepository,
{
    pub fn new(
        activities: VR,
        applications: AR,
        fanout: NotificationFanout<NR, UR>,
        audit: AuditRecorder<LR>,
    ) -> Self {
        Self {
            activities,
            applications,
            fanout,
            audit,
        }
    }

    /// Creates an upcoming activity owned by the actor.
    ///
    /// Requires coordinator (or admin). Validates category, schedule date,
    /// capacity and title before any write; on success fans out an
    /// announcement to all active students and records the audit entry.
    pub fn create(&self, draft: &ActivityDraft, actor: &User) -> ServiceResult<Activity> {
        CREATE_ACCESS.check(actor)?;

        let category = parse_category(&draft.category)?;
        let starts_at = parse_schedule_date(&draft.starts_at)?;

        let mut activity = Activity::new(
            draft.title.clone(),
            category,
            starts_at,
            draft.capacity,
            actor.uuid,
        );
        activity.description = draft.description.clone();
        activity.location = draft.location.clone();

        self.activities.create_activity(&activity)?;

        run_best_effort("notification_fanout", || {
            self.fanout
                .fanout(&LifecycleEvent::ActivityCreated {
                    activity: &activity,
                })
        });
        self.audit.record(
            AuditEntry::new(actions::ACTIVITY_CREATE, format!("created `{}`", activity.title))
                .actor(actor.uuid)
                .entity("activities", activity.uuid)
                .metadata(serde_json::json!({
                    "category": activity.category.as_str(),
                    "capacity": activity.capacity,
                })),
        );

        Ok(activity)
    }

    /// Patches an activity owned by the actor (admin overrides ownership).
    ///
    /// A capacity patch below the current enrollment is rejected as
    /// validation; the enrollment counter itself is not patchable.
    pub fn update(
        &self,
        uuid: ActivityId,
        patch: &ActivityPatch,
        actor: &User,
    ) -> ServiceResult<Activity> {
        let mut activity = self.load(uuid)?;
        MANAGE_ACCESS.check_with_owner(actor, activity.owner_uuid)?;

        if let Some(title) = &patch.title {
            activity.title = title.clone();
        }
        if let Some(description) = &patch.description {
            activity.description = description.clone();
        }
        if let Some(category) = &patch.category {
            activity.category = parse_category(category)?;
        }
        if let Some(location) = &patch.location {
            activity.location = Some(location.clone());
        }
        if let Some(starts_at) = &patch.starts_at {
            activity.starts_at = parse_schedule_date(starts_at)?;
        }
        if let Some(capacity) = patch.capacity {
            activity.capacity = capacity;
        }
        if let Some(status) = &patch.status {
            activity.status = ActivityStatus::parse(status)
                .ok_or_else(|| ValidationError::UnknownStatus(status.clone()))?;
        }

        self.activities.update_activity(&activity)?;

        self.audit.record(
            AuditEntry::new(actions::ACTIVITY_UPDATE, format!("updated `{}`", activity.title))
                .actor(actor.uuid)
                .entity("activities", activity.uuid),
        );

        Ok(activity)
    }

    /// Deletes an activity with its applications and attendance rows.
    ///
    /// Non-admin actors must own the activity and are blocked while any
    /// application is still pending. The cascade commits all-or-nothing;
    /// the audit entry is recorded after the commit.
    pub fn delete(&self, uuid: ActivityId, actor: &User) -> ServiceResult<CascadeSummary> {
        let activity = self.load(uuid)?;
        MANAGE_ACCESS.check_with_owner(actor, activity.owner_uuid)?;

        if !actor.is_admin() {
            let pending = self.applications.count_pending_for_activity(uuid)?;
            if pending > 0 {
                return Err(ServiceError::UnresolvedApplications {
                    activity_uuid: uuid,
                    pending,
                });
            }
        }

        let summary = self.activities.delete_activity_cascade(uuid)?;

        self.audit.record(
            AuditEntry::new(actions::ACTIVITY_DELETE, format!("deleted `{}`", activity.title))
                .actor(actor.uuid)
                .entity("activities", uuid)
                .metadata(serde_json::json!({
                    "attendance_deleted": summary.attendance_deleted,
                    "applications_deleted": summary.applications_deleted,
                })),
        );

        Ok(summary)
    }

    /// Gets one activity by id.
    pub fn get(&self, uuid: ActivityId) -> ServiceResult<Activity> {
        self.load(uuid)
    }

    /// Lists activities using filter and pagination options.
    pub fn list(&self, query: &ActivityListQuery) -> ServiceResult<Vec<Activity>> {
        Ok(self.activities.list_activities(query)?)
    }

    fn load(&self, uuid: ActivityId) -> ServiceResult<Activity> {
        self.activities
            .get_activity(uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "activities",
                uuid,
            })
    }
}

fn parse_category(value: &str) -> Result<ActivityCategory, ValidationError> {
    ActivityCategory::parse(value.trim())
        .ok_or_else(|| ValidationError::UnknownCategory(value.to_string()))
}

fn parse_schedule_date(value: &str) -> Result<i64, ValidationError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|instant| instant.timestamp_millis())
        .map_err(|_| ValidationError::InvalidScheduleDate(value.to_string()))
}
