//! Application lifecycle use-case service.
//!
//! # Responsibility
//! - Drive the pending/approved/rejected state machine under the declared
//!   access policy.
//! - Trigger the fanout/audit side effects after the primary mutation.
//!
//! # Invariants
//! - The enrollment ledger is touched exactly once per `set_status` call,
//!   and only when the transition crosses into or out of `approved`.
//! - Side-effect failures never abort a lifecycle operation.

use crate::auth::{require_ownership, AccessRequirement, PolicyError};
use crate::model::activity::{Activity, ActivityId, ActivityStatus};
use crate::model::application::{Application, ApplicationId, ApplicationStatus};
use crate::model::audit::{actions, AuditEntry};
use crate::model::user::{Role, User, UserId};
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::application_repo::{ApplicationRepository, StatusTransition};
use crate::repo::audit_repo::AuditRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::audit_recorder::AuditRecorder;
use crate::service::notification_fanout::{LifecycleEvent, NotificationFanout};
use crate::service::side_effect::run_best_effort;
use crate::service::{ServiceError, ServiceResult};

const SUBMIT_ACCESS: AccessRequirement = AccessRequirement::for_roles(&[Role::Student]);
const DECIDE_ACCESS: AccessRequirement = AccessRequirement::for_roles(&[Role::Coordinator]);
const PURGE_ACCESS: AccessRequirement = AccessRequirement::for_roles(&[Role::Admin]);

/// Use-case service for the application state machine.
pub struct ApplicationService<AR, VR, NR, UR, LR> {
    applications: AR,
    activities: VR,
    fanout: NotificationFanout<NR, UR>,
    audit: AuditRecorder<LR>,
}

impl<AR, VR, NR, UR, LR> ApplicationService<AR, VR, NR, UR, LR>
where
    AR: ApplicationRepository,
    VR: ActivityRepository,
    NR: NotificationRepository,
    UR: UserRepository,
    LR: AuditRepository,
{
    pub fn new(
        applications: AR,
        activities: VR,
        fanout: NotificationFanout<NR, UR>,
        audit: AuditRecorder<LR>,
    ) -> Self {
        Self {
            applications,
            activities,
            fanout,
            audit,
        }
    }

    /// Submits the actor's application to an activity.
    ///
    /// # Errors
    /// - `DuplicateApplication` when the (student, activity) pair exists.
    /// - `ActivityCompleted` when the activity is closed.
    /// - `ActivityFull` when no seat is left at submission time.
    pub fn submit(&self, actor: &User, activity_uuid: ActivityId) -> ServiceResult<Application> {
        SUBMIT_ACCESS.check(actor)?;

        let activity = self.load_activity(activity_uuid)?;
        if activity.status == ActivityStatus::Completed {
            return Err(ServiceError::ActivityCompleted(activity_uuid));
        }
        if !activity.has_open_seats() {
            return Err(ServiceError::ActivityFull(activity_uuid));
        }
        if self
            .applications
            .find_by_pair(actor.uuid, activity_uuid)?
            .is_some()
        {
            return Err(ServiceError::DuplicateApplication {
                detail: format!("student {} / activity {}", actor.uuid, activity_uuid),
            });
        }

        let application = Application::new(actor.uuid, activity_uuid);
        self.applications.create_application(&application)?;

        run_best_effort("notification_fanout", || {
            self.fanout.fanout(&LifecycleEvent::ApplicationSubmitted {
                application: &application,
                activity: &activity,
            })
        });
        self.audit.record(
            AuditEntry::new(
                actions::APPLICATION_SUBMIT,
                format!("applied to `{}`", activity.title),
            )
            .actor(actor.uuid)
            .entity("applications", application.uuid)
            .metadata(serde_json::json!({ "activity": activity_uuid })),
        );

        Ok(application)
    }

    /// Decides (or re-decides) an application.
    ///
    /// Requires the owning coordinator or an admin; students are always
    /// rejected on role. `notes` replaces the stored decision notes.
    pub fn set_status(
        &self,
        uuid: ApplicationId,
        new_status: ApplicationStatus,
        notes: Option<&str>,
        actor: &User,
    ) -> ServiceResult<StatusTransition> {
        let application = self.load_application(uuid)?;
        let activity = self.load_activity(application.activity_uuid)?;
        DECIDE_ACCESS.check_with_owner(actor, activity.owner_uuid)?;

        let transition = self
            .applications
            .transition_status(uuid, new_status, notes)?;

        run_best_effort("notification_fanout", || {
            self.fanout.fanout(&LifecycleEvent::ApplicationDecided {
                application: &transition.application,
                activity: &activity,
            })
        });
        self.audit.record(
            AuditEntry::new(
                actions::APPLICATION_STATUS,
                format!(
                    "application for `{}` moved {} -> {}",
                    activity.title,
                    transition.old_status.as_str(),
                    transition.new_status.as_str()
                ),
            )
            .actor(actor.uuid)
            .target(transition.application.student_uuid)
            .entity("applications", uuid)
            .metadata(serde_json::json!({
                "from": transition.old_status.as_str(),
                "to": transition.new_status.as_str(),
            })),
        );

        Ok(transition)
    }

    /// Hard-deletes an application (admin only).
    ///
    /// The activity's enrollment counter is intentionally left at its last
    /// `set_status` value, even when the deleted application was approved.
    pub fn delete(&self, uuid: ApplicationId, actor: &User) -> ServiceResult<()> {
        PURGE_ACCESS.check(actor)?;

        let application = self.load_application(uuid)?;
        self.applications.delete_application(uuid)?;

        self.audit.record(
            AuditEntry::new(actions::APPLICATION_DELETE, "application deleted")
                .actor(actor.uuid)
                .target(application.student_uuid)
                .entity("applications", uuid)
                .metadata(serde_json::json!({
                    "activity": application.activity_uuid,
                    "status": application.status.as_str(),
                })),
        );

        Ok(())
    }

    /// Gets one application, enforcing view rights: the owning student, the
    /// coordinator owning its activity, or an admin.
    pub fn get(&self, uuid: ApplicationId, actor: &User) -> ServiceResult<Application> {
        let application = self.load_application(uuid)?;

        if actor.uuid == application.student_uuid || actor.is_admin() {
            return Ok(application);
        }
        if actor.role == Role::Coordinator {
            let activity = self.load_activity(application.activity_uuid)?;
            require_ownership(actor, activity.owner_uuid)?;
            return Ok(application);
        }
        Err(PolicyError::NotOwner.into())
    }

    /// Lists a student's applications (self or admin).
    pub fn list_for_student(
        &self,
        student_uuid: UserId,
        actor: &User,
    ) -> ServiceResult<Vec<Application>> {
        require_ownership(actor, student_uuid)?;
        Ok(self.applications.list_for_student(student_uuid)?)
    }

    /// Lists an activity's applications (owning coordinator or admin).
    pub fn list_for_activity(
        &self,
        activity_uuid: ActivityId,
        actor: &User,
    ) -> ServiceResult<Vec<Application>> {
        let activity = self.load_activity(activity_uuid)?;
        DECIDE_ACCESS.check_with_owner(actor, activity.owner_uuid)?;
        Ok(self.applications.list_for_activity(activity_uuid)?)
    }

    fn load_application(&self, uuid: ApplicationId) -> ServiceResult<Application> {
        self.applications
            .get_application(uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "applications",
                uuid,
            })
    }

    fn load_activity(&self, uuid: ActivityId) -> ServiceResult<Activity> {
        self.activities
            .get_activity(uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "activities",
                uuid,
            })
    }
}
