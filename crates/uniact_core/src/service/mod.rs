//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repositories, the authorization policy, the notification
//!   fanout and the audit recorder into lifecycle operations.
//! - Map every failure to one tagged error kind with a stable HTTP-style
//!   status class.
//!
//! # Invariants
//! - Primary-mutation errors propagate and abort the operation with no
//!   partial writes.
//! - Fanout and audit failures never escalate; they pass through the
//!   best-effort executor only.

use crate::auth::{AuthError, PolicyError};
use crate::model::activity::ActivityId;
use crate::model::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod account_service;
pub mod activity_service;
pub mod application_service;
pub mod audit_recorder;
pub mod notification_fanout;
pub(crate) mod side_effect;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Tagged failure for every lifecycle operation.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed input, rejected before any mutation (400).
    Validation(ValidationError),
    /// Authentication failure (401).
    Auth(AuthError),
    /// Role/ownership failure (403).
    Policy(PolicyError),
    /// Missing activity/application/account (404).
    NotFound { entity: &'static str, uuid: Uuid },
    /// Second application for the same (student, activity) pair (409).
    DuplicateApplication { detail: String },
    /// Email already registered, case-insensitively (409).
    DuplicateEmail { email: String },
    /// No remaining seat on the activity (409).
    ActivityFull(ActivityId),
    /// Applications to a completed activity are closed (409).
    ActivityCompleted(ActivityId),
    /// Non-admin delete blocked while pending applications exist (409).
    UnresolvedApplications {
        activity_uuid: ActivityId,
        pending: i64,
    },
    /// Store transport failure (500).
    Repo(RepoError),
}

impl ServiceError {
    /// HTTP-style status class for this failure.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Auth(err) => err.http_status(),
            Self::Policy(err) => err.http_status(),
            Self::NotFound { .. } => 404,
            Self::DuplicateApplication { .. }
            | Self::DuplicateEmail { .. }
            | Self::ActivityFull(_)
            | Self::ActivityCompleted(_)
            | Self::UnresolvedApplications { .. } => 409,
            Self::Repo(_) => 500,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Policy(err) => write!(f, "{err}"),
            Self::NotFound { entity, uuid } => write!(f, "{entity} not found: {uuid}"),
            Self::DuplicateApplication { detail } => {
                write!(f, "application already exists for {detail}")
            }
            Self::DuplicateEmail { email } => {
                write!(f, "email is already registered: {email}")
            }
            Self::ActivityFull(uuid) => write!(f, "activity {uuid} is full"),
            Self::ActivityCompleted(uuid) => {
                write!(f, "activity {uuid} is completed and closed to applications")
            }
            Self::UnresolvedApplications {
                activity_uuid,
                pending,
            } => write!(
                f,
                "activity {activity_uuid} still has {pending} pending application(s)"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::Policy(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<PolicyError> for ServiceError {
    fn from(value: PolicyError) -> Self {
        Self::Policy(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, uuid } => Self::NotFound { entity, uuid },
            RepoError::CapacityExceeded(uuid) => Self::ActivityFull(uuid),
            RepoError::Duplicate {
                entity: "applications",
                detail,
            } => Self::DuplicateApplication { detail },
            RepoError::Duplicate {
                entity: "users",
                detail,
            } => Self::DuplicateEmail { email: detail },
            other => Self::Repo(other),
        }
    }
}
