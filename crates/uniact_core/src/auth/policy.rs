//! Role- and ownership-based access decisions.
//!
//! # Responsibility
//! - Provide the two primitive checks every mutating operation composes:
//!   role membership and resource ownership.
//! - Let services declare their access requirement as a `const` value checked
//!   at the top of the operation; there is no implicit default-allow.
//!
//! # Invariants
//! - Admin satisfies every role requirement and every ownership check.

use crate::model::user::{Role, User, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authorization failures, all mapped to the 403 class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// Actor's role is not in the operation's allowed set.
    InsufficientRole(Role),
    /// Actor is neither the resource owner nor an admin.
    NotOwner,
}

impl PolicyError {
    pub fn http_status(&self) -> u16 {
        403
    }
}

impl Display for PolicyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientRole(role) => {
                write!(f, "role `{}` is not permitted for this operation", role.as_str())
            }
            Self::NotOwner => write!(f, "actor does not own this resource"),
        }
    }
}

impl Error for PolicyError {}

/// Passes when the actor is admin or holds one of the allowed roles.
pub fn require_role(actor: &User, allowed: &[Role]) -> Result<(), PolicyError> {
    if actor.is_admin() || allowed.contains(&actor.role) {
        return Ok(());
    }
    Err(PolicyError::InsufficientRole(actor.role))
}

/// Passes when the actor is the owner or an admin.
pub fn require_ownership(actor: &User, owner_uuid: UserId) -> Result<(), PolicyError> {
    if actor.is_admin() || actor.uuid == owner_uuid {
        return Ok(());
    }
    Err(PolicyError::NotOwner)
}

/// Statically declared access requirement for one operation.
///
/// Services hold these as `const` items so the required composition is
/// readable at the call site:
///
/// ```
/// use uniact_core::auth::AccessRequirement;
/// use uniact_core::model::user::Role;
///
/// const DECIDE_ACCESS: AccessRequirement =
///     AccessRequirement::for_roles(&[Role::Coordinator]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AccessRequirement {
    roles: &'static [Role],
}

impl AccessRequirement {
    pub const fn for_roles(roles: &'static [Role]) -> Self {
        Self { roles }
    }

    /// Role check only.
    pub fn check(&self, actor: &User) -> Result<(), PolicyError> {
        require_role(actor, self.roles)
    }

    /// Role check, then ownership check (admin passes both implicitly).
    pub fn check_with_owner(&self, actor: &User, owner_uuid: UserId) -> Result<(), PolicyError> {
        require_role(actor, self.roles)?;
        require_ownership(actor, owner_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::{require_ownership, require_role, AccessRequirement, PolicyError};
    use crate::model::user::{Role, User};
    use uuid::Uuid;

    fn user(role: Role) -> User {
        User::new(format!("{}@uni.edu", role.as_str()), "hash", role)
    }

    #[test]
    fn admin_passes_any_role_requirement() {
        let admin = user(Role::Admin);
        assert!(require_role(&admin, &[Role::Student]).is_ok());
        assert!(require_role(&admin, &[]).is_ok());
    }

    #[test]
    fn role_outside_allowed_set_is_rejected() {
        let student = user(Role::Student);
        assert_eq!(
            require_role(&student, &[Role::Coordinator])
                .expect_err("student must be rejected"),
            PolicyError::InsufficientRole(Role::Student)
        );
    }

    #[test]
    fn ownership_requires_identity_match_or_admin() {
        let coordinator = user(Role::Coordinator);
        let foreign = Uuid::new_v4();

        assert!(require_ownership(&coordinator, coordinator.uuid).is_ok());
        assert_eq!(
            require_ownership(&coordinator, foreign).expect_err("foreign resource"),
            PolicyError::NotOwner
        );
        assert!(require_ownership(&user(Role::Admin), foreign).is_ok());
    }

    #[test]
    fn requirement_composes_role_then_ownership() {
        const DECIDE: AccessRequirement = AccessRequirement::for_roles(&[Role::Coordinator]);

        let coordinator = user(Role::Coordinator);
        let student = user(Role::Student);

        assert!(DECIDE.check_with_owner(&coordinator, coordinator.uuid).is_ok());
        // Role failure wins over ownership failure for a student owner.
        assert_eq!(
            DECIDE
                .check_with_owner(&student, student.uuid)
                .expect_err("student is rejected on role"),
            PolicyError::InsufficientRole(Role::Student)
        );
        assert_eq!(
            DECIDE
                .check_with_owner(&coordinator, Uuid::new_v4())
                .expect_err("non-owner coordinator is rejected"),
            PolicyError::NotOwner
        );
    }
}
