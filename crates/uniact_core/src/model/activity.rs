//! Activity domain model.
//!
//! # Responsibility
//! - Define the capacity-limited activity record and its enumerations.
//! - Enforce the enrollment invariant at the model boundary.
//!
//! # Invariants
//! - `capacity` is a positive integer.
//! - `0 <= enrolled <= capacity` at all times; `enrolled` is mutated only by
//!   the repository-level enrollment ledger, never patched directly.

use crate::model::user::UserId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for activities.
pub type ActivityId = Uuid;

/// Lifecycle state of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upcoming" => Some(Self::Upcoming),
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Fixed category enumeration validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Sports,
    Culture,
    Academic,
    Volunteer,
    Social,
}

impl ActivityCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sports => "sports",
            Self::Culture => "culture",
            Self::Academic => "academic",
            Self::Volunteer => "volunteer",
            Self::Social => "social",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sports" => Some(Self::Sports),
            "culture" => Some(Self::Culture),
            "academic" => Some(Self::Academic),
            "volunteer" => Some(Self::Volunteer),
            "social" => Some(Self::Social),
            _ => None,
        }
    }
}

/// Capacity-limited activity owned by one coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub uuid: ActivityId,
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub location: Option<String>,
    /// Scheduled start in epoch milliseconds.
    pub starts_at: i64,
    pub capacity: i64,
    /// Approved-application count, maintained by the enrollment ledger.
    pub enrolled: i64,
    /// Coordinator holding exclusive non-admin management rights.
    pub owner_uuid: UserId,
    pub status: ActivityStatus,
}

impl Activity {
    /// Creates an upcoming activity with zero enrollment.
    pub fn new(
        title: impl Into<String>,
        category: ActivityCategory,
        starts_at: i64,
        capacity: i64,
        owner_uuid: UserId,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            category,
            location: None,
            starts_at,
            capacity,
            enrolled: 0,
            owner_uuid,
            status: ActivityStatus::Upcoming,
        }
    }

    /// Whether one more approval would still fit.
    pub fn has_open_seats(&self) -> bool {
        self.enrolled < self.capacity
    }

    /// Checks title, capacity and the enrollment range before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.capacity <= 0 {
            return Err(ValidationError::NonPositiveCapacity(self.capacity));
        }
        if self.enrolled < 0 || self.enrolled > self.capacity {
            return Err(ValidationError::EnrolledOutOfRange {
                enrolled: self.enrolled,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityCategory, ActivityStatus};
    use crate::model::ValidationError;
    use uuid::Uuid;

    fn sample() -> Activity {
        Activity::new("Chess night", ActivityCategory::Social, 1_700_000_000_000, 8, Uuid::new_v4())
    }

    #[test]
    fn new_activity_starts_upcoming_and_empty() {
        let activity = sample();
        assert_eq!(activity.status, ActivityStatus::Upcoming);
        assert_eq!(activity.enrolled, 0);
        assert!(activity.has_open_seats());
    }

    #[test]
    fn validate_rejects_non_positive_capacity() {
        let mut activity = sample();
        activity.capacity = 0;
        assert_eq!(
            activity.validate().expect_err("zero capacity must fail"),
            ValidationError::NonPositiveCapacity(0)
        );
    }

    #[test]
    fn validate_rejects_enrollment_above_capacity() {
        let mut activity = sample();
        activity.enrolled = 9;
        assert!(matches!(
            activity.validate().expect_err("overfull must fail"),
            ValidationError::EnrolledOutOfRange { enrolled: 9, capacity: 8 }
        ));
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut activity = sample();
        activity.title = "   ".to_string();
        assert_eq!(
            activity.validate().expect_err("blank title must fail"),
            ValidationError::EmptyTitle
        );
    }

    #[test]
    fn category_codec_round_trips() {
        for category in [
            ActivityCategory::Sports,
            ActivityCategory::Culture,
            ActivityCategory::Academic,
            ActivityCategory::Volunteer,
            ActivityCategory::Social,
        ] {
            assert_eq!(ActivityCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(ActivityCategory::parse("esports"), None);
    }
}
