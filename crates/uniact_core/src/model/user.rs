//! Account domain model.
//!
//! # Responsibility
//! - Define the authenticated principal shared by every guarded operation.
//! - Normalize and validate email identity before persistence.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another account.
//! - `email` is stored lowercase; uniqueness is case-insensitive.
//! - `revocation_epoch` only ever increases; bumping it invalidates every
//!   previously issued token for this account.

use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for accounts.
pub type UserId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Authorization role attached to every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Applies to activities; owns only their own applications.
    Student,
    /// Owns activities and decides their applications.
    Coordinator,
    /// Satisfies every role requirement and overrides ownership.
    Admin,
}

impl Role {
    /// Stable string id used in storage and token claims.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coordinator => "coordinator",
            Self::Admin => "admin",
        }
    }

    /// Parses the stable string encoding.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "coordinator" => Some(Self::Coordinator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Account availability state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Authenticated principal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID used for ownership checks and audit attribution.
    pub uuid: UserId,
    /// Lowercased email identity, unique case-insensitively.
    pub email: String,
    /// Opaque hash supplied by the external password-hash collaborator.
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    /// Monotone counter compared against token claims during verification.
    pub revocation_epoch: i64,
}

impl User {
    /// Creates an active account with a generated stable ID.
    ///
    /// The email is normalized to lowercase; validation is deferred to
    /// `validate()` on the repository write path.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            email: normalize_email(&email.into()),
            password_hash: password_hash.into(),
            role,
            status: AccountStatus::Active,
            revocation_epoch: 0,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Checks email shape before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

/// Lowercases and trims an email for case-insensitive identity.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, AccountStatus, Role, User};
    use crate::model::ValidationError;

    #[test]
    fn new_user_is_active_with_epoch_zero() {
        let user = User::new("Ada@Example.EDU", "hash", Role::Student);
        assert_eq!(user.email, "ada@example.edu");
        assert_eq!(user.status, AccountStatus::Active);
        assert_eq!(user.revocation_epoch, 0);
    }

    #[test]
    fn validate_rejects_malformed_email() {
        let mut user = User::new("not-an-email", "hash", Role::Student);
        assert_eq!(
            user.validate().expect_err("shape check must fail"),
            ValidationError::InvalidEmail("not-an-email".to_string())
        );

        user.email = String::new();
        assert_eq!(
            user.validate().expect_err("empty email must fail"),
            ValidationError::EmptyEmail
        );
    }

    #[test]
    fn role_codec_round_trips() {
        for role in [Role::Student, Role::Coordinator, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("STUDENT"), None);
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Zoe@Uni.EDU "), "zoe@uni.edu");
    }
}
