//! Application repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide application CRUD with the (student, activity) uniqueness
//!   contract surfaced as a semantic `Duplicate` error.
//! - Own the atomic status transition: the application row update and its
//!   enrollment-ledger effect commit or roll back together.
//!
//! # Invariants
//! - The ledger is touched exactly once per transition, and only when the
//!   transition crosses into or out of `approved`.
//! - `delete_application` removes dependent attendance rows in the same
//!   transaction; it never adjusts the enrollment counter.

use crate::model::application::{Application, ApplicationId, ApplicationStatus};
use crate::model::user::UserId;
use crate::repo::activity_repo::{decrement_enrolled_on, increment_enrolled_on};
use crate::repo::{is_constraint_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const APPLICATION_SELECT_SQL: &str = "SELECT
    uuid,
    student_uuid,
    activity_uuid,
    status,
    notes
FROM applications";

/// Outcome of one status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// The application as persisted after the transition.
    pub application: Application,
    pub old_status: ApplicationStatus,
    pub new_status: ApplicationStatus,
}

impl StatusTransition {
    /// Whether this transition consumed a seat.
    pub fn entered_approved(&self) -> bool {
        self.old_status != ApplicationStatus::Approved
            && self.new_status == ApplicationStatus::Approved
    }

    /// Whether this transition released a seat.
    pub fn left_approved(&self) -> bool {
        self.old_status == ApplicationStatus::Approved
            && self.new_status != ApplicationStatus::Approved
    }
}

/// Repository interface for application persistence.
pub trait ApplicationRepository {
    fn create_application(&self, application: &Application) -> RepoResult<ApplicationId>;
    fn get_application(&self, uuid: ApplicationId) -> RepoResult<Option<Application>>;
    fn find_by_pair(
        &self,
        student_uuid: UserId,
        activity_uuid: Uuid,
    ) -> RepoResult<Option<Application>>;
    fn list_for_activity(&self, activity_uuid: Uuid) -> RepoResult<Vec<Application>>;
    fn list_for_student(&self, student_uuid: UserId) -> RepoResult<Vec<Application>>;
    fn count_pending_for_activity(&self, activity_uuid: Uuid) -> RepoResult<i64>;
    /// Applies `new_status` + `notes` and the matching ledger effect in one
    /// transaction. `notes` replaces the stored value as given.
    fn transition_status(
        &self,
        uuid: ApplicationId,
        new_status: ApplicationStatus,
        notes: Option<&str>,
    ) -> RepoResult<StatusTransition>;
    /// Hard delete of the application and its attendance rows.
    fn delete_application(&self, uuid: ApplicationId) -> RepoResult<()>;
}

/// SQLite-backed application repository.
pub struct SqliteApplicationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteApplicationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ApplicationRepository for SqliteApplicationRepository<'_> {
    fn create_application(&self, application: &Application) -> RepoResult<ApplicationId> {
        let inserted = self.conn.execute(
            "INSERT INTO applications (uuid, student_uuid, activity_uuid, status, notes)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                application.uuid.to_string(),
                application.student_uuid.to_string(),
                application.activity_uuid.to_string(),
                application.status.as_str(),
                application.notes.as_deref(),
            ],
        );

        match inserted {
            Ok(_) => Ok(application.uuid),
            Err(err) if is_constraint_violation(&err) => Err(RepoError::Duplicate {
                entity: "applications",
                detail: format!(
                    "student {} / activity {}",
                    application.student_uuid, application.activity_uuid
                ),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn get_application(&self, uuid: ApplicationId) -> RepoResult<Option<Application>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{APPLICATION_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_application_row(row)?));
        }
        Ok(None)
    }

    fn find_by_pair(
        &self,
        student_uuid: UserId,
        activity_uuid: Uuid,
    ) -> RepoResult<Option<Application>> {
        let mut stmt = self.conn.prepare(&format!(
            "{APPLICATION_SELECT_SQL} WHERE student_uuid = ?1 AND activity_uuid = ?2;"
        ))?;
        let mut rows = stmt.query(params![student_uuid.to_string(), activity_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_application_row(row)?));
        }
        Ok(None)
    }

    fn list_for_activity(&self, activity_uuid: Uuid) -> RepoResult<Vec<Application>> {
        let mut stmt = self.conn.prepare(&format!(
            "{APPLICATION_SELECT_SQL} WHERE activity_uuid = ?1 ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([activity_uuid.to_string()])?;
        let mut applications = Vec::new();
        while let Some(row) = rows.next()? {
            applications.push(parse_application_row(row)?);
        }
        Ok(applications)
    }

    fn list_for_student(&self, student_uuid: UserId) -> RepoResult<Vec<Application>> {
        let mut stmt = self.conn.prepare(&format!(
            "{APPLICATION_SELECT_SQL} WHERE student_uuid = ?1 ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([student_uuid.to_string()])?;
        let mut applications = Vec::new();
        while let Some(row) = rows.next()? {
            applications.push(parse_application_row(row)?);
        }
        Ok(applications)
    }

    fn count_pending_for_activity(&self, activity_uuid: Uuid) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM applications WHERE activity_uuid = ?1 AND status = 'pending';",
            [activity_uuid.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn transition_status(
        &self,
        uuid: ApplicationId,
        new_status: ApplicationStatus,
        notes: Option<&str>,
    ) -> RepoResult<StatusTransition> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let mut application = get_application_in_tx(&tx, uuid)?.ok_or(RepoError::NotFound {
            entity: "applications",
            uuid,
        })?;
        let old_status = application.status;

        // Ledger effect depends on the transition, not the absolute state:
        // approved->approved and pending->rejected are counter no-ops.
        if old_status != ApplicationStatus::Approved && new_status == ApplicationStatus::Approved {
            increment_enrolled_on(&tx, application.activity_uuid)?;
        } else if old_status == ApplicationStatus::Approved
            && new_status != ApplicationStatus::Approved
        {
            decrement_enrolled_on(&tx, application.activity_uuid)?;
        }

        tx.execute(
            "UPDATE applications
             SET status = ?2, notes = ?3, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![uuid.to_string(), new_status.as_str(), notes],
        )?;
        tx.commit()?;

        application.status = new_status;
        application.notes = notes.map(str::to_string);
        Ok(StatusTransition {
            application,
            old_status,
            new_status,
        })
    }

    fn delete_application(&self, uuid: ApplicationId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let uuid_text = uuid.to_string();

        tx.execute(
            "DELETE FROM attendance WHERE application_uuid = ?1;",
            [uuid_text.as_str()],
        )?;
        let changed = tx.execute(
            "DELETE FROM applications WHERE uuid = ?1;",
            [uuid_text.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "applications",
                uuid,
            });
        }

        tx.commit()?;
        Ok(())
    }
}

fn get_application_in_tx(tx: &Connection, uuid: ApplicationId) -> RepoResult<Option<Application>> {
    let mut stmt = tx.prepare(&format!("{APPLICATION_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_application_row(row)?));
    }
    Ok(None)
}

fn parse_application_row(row: &Row<'_>) -> RepoResult<Application> {
    let uuid_text: String = row.get("uuid")?;
    let student_text: String = row.get("student_uuid")?;
    let activity_text: String = row.get("activity_uuid")?;

    let status_text: String = row.get("status")?;
    let status = ApplicationStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in applications.status"
        ))
    })?;

    Ok(Application {
        uuid: parse_uuid(&uuid_text, "applications.uuid")?,
        student_uuid: parse_uuid(&student_text, "applications.student_uuid")?,
        activity_uuid: parse_uuid(&activity_text, "applications.activity_uuid")?,
        status,
        notes: row.get("notes")?,
    })
}
