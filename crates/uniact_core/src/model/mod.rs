//! Domain model for accounts, activities, applications and their side-effect
//! records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Provide stable string codecs for every persisted enumeration.
//! - Centralize input validation errors shared by repositories and services.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Enum string encodings are snake_case and never change once persisted.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod activity;
pub mod application;
pub mod audit;
pub mod notification;
pub mod user;

/// Input/state validation failures shared across the model layer.
///
/// Repositories call `validate()` before SQL mutations; services use the same
/// kinds for request-shaped input (category strings, schedule dates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyEmail,
    InvalidEmail(String),
    EmptyTitle,
    NonPositiveCapacity(i64),
    EnrolledOutOfRange { enrolled: i64, capacity: i64 },
    UnknownCategory(String),
    UnknownRole(String),
    UnknownStatus(String),
    InvalidScheduleDate(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail(value) => write!(f, "email is not well-formed: `{value}`"),
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::NonPositiveCapacity(value) => {
                write!(f, "capacity must be a positive integer, got {value}")
            }
            Self::EnrolledOutOfRange { enrolled, capacity } => write!(
                f,
                "enrolled count {enrolled} is outside the range 0..={capacity}"
            ),
            Self::UnknownCategory(value) => write!(f, "activity category is unsupported: {value}"),
            Self::UnknownRole(value) => write!(f, "role is unsupported: {value}"),
            Self::UnknownStatus(value) => write!(f, "status is unsupported: {value}"),
            Self::InvalidScheduleDate(value) => {
                write!(f, "schedule date is not a valid RFC 3339 timestamp: `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}
