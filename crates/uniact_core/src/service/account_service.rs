//! Account use-case service: registration, login, password rotation and
//! activation toggling.
//!
//! # Responsibility
//! - Own the operations that mint tokens and move the revocation epoch.
//!
//! # Invariants
//! - Unknown email and wrong password are indistinguishable to the caller
//!   (`InvalidCredentials`).
//! - A password change bumps the revocation epoch in the same statement that
//!   stores the new hash; every previously issued token turns `TokenRevoked`.

use crate::auth::{AccessRequirement, AuthError, PasswordVerifier, TokenAuthority};
use crate::model::audit::{actions, AuditEntry};
use crate::model::user::{AccountStatus, Role, User, UserId};
use crate::model::ValidationError;
use crate::repo::audit_repo::AuditRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::audit_recorder::AuditRecorder;
use crate::service::{ServiceError, ServiceResult};

const STATUS_ACCESS: AccessRequirement = AccessRequirement::for_roles(&[Role::Admin]);

/// Successful login payload.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

/// Use-case service for account management.
pub struct AccountService<UR, LR, PV> {
    users: UR,
    audit: AuditRecorder<LR>,
    verifier: PV,
    tokens: TokenAuthority,
}

impl<UR, LR, PV> AccountService<UR, LR, PV>
where
    UR: UserRepository,
    LR: AuditRepository,
    PV: PasswordVerifier,
{
    pub fn new(users: UR, audit: AuditRecorder<LR>, verifier: PV, tokens: TokenAuthority) -> Self {
        Self {
            users,
            audit,
            verifier,
            tokens,
        }
    }

    /// Registers a new active account.
    ///
    /// `role` arrives as request-shaped input and is validated against the
    /// fixed role set. The email is validated and lowercased by the model; a
    /// case-insensitive clash surfaces as a duplicate conflict.
    pub fn register(&self, email: &str, password_hash: &str, role: &str) -> ServiceResult<User> {
        let role = Role::parse(role.trim())
            .ok_or_else(|| ValidationError::UnknownRole(role.to_string()))?;
        let user = User::new(email, password_hash, role);
        self.users.create_user(&user)?;

        self.audit.record(
            AuditEntry::new(actions::USER_REGISTER, format!("registered {}", user.email))
                .target(user.uuid)
                .entity("users", user.uuid)
                .metadata(serde_json::json!({ "role": user.role.as_str() })),
        );

        Ok(user)
    }

    /// Verifies credentials and issues a bearer token.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let user = match self.users.get_user_by_email(email)? {
            Some(user) => user,
            None => {
                self.record_login_failure(email, "unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.verifier.verify(password, &user.password_hash) {
            self.record_login_failure(email, "wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active() {
            self.record_login_failure(email, "inactive account");
            return Err(AuthError::IdentityInactive.into());
        }

        let token = self.tokens.issue(&user);
        Ok(LoginOutcome { user, token })
    }

    /// Rotates a password for the target account (self or admin).
    ///
    /// Non-admin actors must present the current password. Returns the new
    /// revocation epoch.
    pub fn change_password(
        &self,
        target_uuid: UserId,
        current_password: &str,
        new_password_hash: &str,
        actor: &User,
    ) -> ServiceResult<i64> {
        crate::auth::require_ownership(actor, target_uuid)?;

        let target = self
            .users
            .get_user(target_uuid)?
            .ok_or(ServiceError::NotFound {
                entity: "users",
                uuid: target_uuid,
            })?;

        if !actor.is_admin() && !self.verifier.verify(current_password, &target.password_hash) {
            return Err(AuthError::InvalidCredentials.into());
        }

        let epoch = self.users.rotate_password(target_uuid, new_password_hash)?;

        self.audit.record(
            AuditEntry::new(actions::PASSWORD_CHANGE, "password rotated")
                .actor(actor.uuid)
                .target(target_uuid)
                .entity("users", target_uuid)
                .metadata(serde_json::json!({ "revocation_epoch": epoch })),
        );

        Ok(epoch)
    }

    /// Toggles an account between active and inactive (admin only).
    pub fn set_account_status(
        &self,
        target_uuid: UserId,
        status: AccountStatus,
        actor: &User,
    ) -> ServiceResult<()> {
        STATUS_ACCESS.check(actor)?;

        self.users.set_account_status(target_uuid, status)?;

        self.audit.record(
            AuditEntry::new(actions::USER_STATUS_TOGGLE, "account status changed")
                .actor(actor.uuid)
                .target(target_uuid)
                .entity("users", target_uuid)
                .metadata(serde_json::json!({ "status": status.as_str() })),
        );

        Ok(())
    }

    fn record_login_failure(&self, email: &str, reason: &str) {
        self.audit.record(
            AuditEntry::new(actions::LOGIN_FAILURE, format!("login failed for {email}"))
                .metadata(serde_json::json!({ "reason": reason })),
        );
    }
}
