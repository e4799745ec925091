//! Application domain model.
//!
//! # Responsibility
//! - Define the student-to-activity application record and its status set.
//!
//! # Invariants
//! - At most one application exists per (student, activity) pair.
//! - Every status may transition to every other status; none is immutable.

use crate::model::activity::ActivityId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for applications.
pub type ApplicationId = Uuid;

/// Decision state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// One student's application to one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub uuid: ApplicationId,
    pub student_uuid: UserId,
    pub activity_uuid: ActivityId,
    pub status: ApplicationStatus,
    /// Decision notes written by the deciding coordinator/admin.
    pub notes: Option<String>,
}

impl Application {
    /// Creates a pending application for the given pair.
    pub fn new(student_uuid: UserId, activity_uuid: ActivityId) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            student_uuid,
            activity_uuid,
            status: ApplicationStatus::Pending,
            notes: None,
        }
    }
}
