//! Core domain logic for the university activity-management backend.
//! This crate is the single source of truth for business invariants:
//! token-gated access control, the application state machine with its
//! enrollment-capacity invariant, and the best-effort side-effect fanout.

pub mod auth;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::{
    bearer_token, require_ownership, require_role, AccessRequirement, AuthError,
    PasswordVerifier, PlainTextVerifier, PolicyError, TokenAuthority, TokenClaims,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{Activity, ActivityCategory, ActivityId, ActivityStatus};
pub use model::application::{Application, ApplicationId, ApplicationStatus};
pub use model::audit::{actions as audit_actions, AuditEntry, AuditEntryId};
pub use model::notification::{Notification, NotificationId, NotificationKind};
pub use model::user::{AccountStatus, Role, User, UserId};
pub use model::ValidationError;
pub use repo::activity_repo::{
    ActivityListQuery, ActivityRepository, CascadeSummary, SqliteActivityRepository,
};
pub use repo::application_repo::{
    ApplicationRepository, SqliteApplicationRepository, StatusTransition,
};
pub use repo::audit_repo::{AuditRepository, SqliteAuditRepository};
pub use repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountService, LoginOutcome};
pub use service::activity_service::{ActivityDraft, ActivityPatch, ActivityService};
pub use service::application_service::ApplicationService;
pub use service::audit_recorder::AuditRecorder;
pub use service::notification_fanout::{LifecycleEvent, NotificationFanout};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
