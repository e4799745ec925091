//! Account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide account CRUD plus the revocation-epoch rotation used by token
//!   verification.
//!
//! # Invariants
//! - Email uniqueness is case-insensitive (`COLLATE NOCASE` unique column);
//!   writes receive already-normalized lowercase emails from the model.
//! - `rotate_password` updates the hash and bumps `revocation_epoch` in one
//!   statement; the two can never diverge.

use crate::model::user::{AccountStatus, Role, User, UserId};
use crate::repo::{is_constraint_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    email,
    password_hash,
    role,
    status,
    revocation_epoch
FROM users";

/// Repository interface for account persistence.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, uuid: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Lists accounts holding `role`, optionally restricted to active ones.
    fn list_by_role(&self, role: Role, only_active: bool) -> RepoResult<Vec<User>>;
    fn set_account_status(&self, uuid: UserId, status: AccountStatus) -> RepoResult<()>;
    /// Replaces the password hash and bumps the revocation epoch atomically.
    /// Returns the new epoch.
    fn rotate_password(&self, uuid: UserId, new_hash: &str) -> RepoResult<i64>;
}

/// SQLite-backed account repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO users (uuid, email, password_hash, role, status, revocation_epoch)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.uuid.to_string(),
                user.email.as_str(),
                user.password_hash.as_str(),
                user.role.as_str(),
                user.status.as_str(),
                user.revocation_epoch,
            ],
        );

        match inserted {
            Ok(_) => Ok(user.uuid),
            Err(err) if is_constraint_violation(&err) => Err(RepoError::Duplicate {
                entity: "users",
                detail: user.email.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn get_user(&self, uuid: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"))?;
        let mut rows = stmt.query([email.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_by_role(&self, role: Role, only_active: bool) -> RepoResult<Vec<User>> {
        let mut sql = format!("{USER_SELECT_SQL} WHERE role = ?1");
        if only_active {
            sql.push_str(" AND status = 'active'");
        }
        sql.push_str(" ORDER BY email ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([role.as_str()])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn set_account_status(&self, uuid: UserId, status: AccountStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET status = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![uuid.to_string(), status.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "users",
                uuid,
            });
        }
        Ok(())
    }

    fn rotate_password(&self, uuid: UserId, new_hash: &str) -> RepoResult<i64> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                password_hash = ?2,
                revocation_epoch = revocation_epoch + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![uuid.to_string(), new_hash],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "users",
                uuid,
            });
        }

        let epoch = self.conn.query_row(
            "SELECT revocation_epoch FROM users WHERE uuid = ?1;",
            [uuid.to_string()],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(epoch)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "users.uuid")?;

    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;

    let status_text: String = row.get("status")?;
    let status = AccountStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in users.status"))
    })?;

    Ok(User {
        uuid,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role,
        status,
        revocation_epoch: row.get("revocation_epoch")?,
    })
}
