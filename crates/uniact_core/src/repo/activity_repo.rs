//! Activity repository contracts, SQLite implementation, and the enrollment
//! ledger.
//!
//! # Responsibility
//! - Provide activity CRUD plus the conditional enrollment counter updates.
//! - Own the cascading delete across attendance/applications/activities.
//!
//! # Invariants
//! - `enrolled` is mutated only through the ledger statements below, never by
//!   `update_activity`.
//! - The increment is a single conditional UPDATE checked via affected-row
//!   count; no read-check-then-write in application code.
//! - The cascading delete is all-or-nothing inside one immediate transaction.

use crate::model::activity::{Activity, ActivityCategory, ActivityId, ActivityStatus};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    category,
    location,
    starts_at,
    capacity,
    enrolled,
    owner_uuid,
    status
FROM activities";

/// Query options for listing activities.
#[derive(Debug, Clone, Default)]
pub struct ActivityListQuery {
    pub status: Option<ActivityStatus>,
    pub owner_uuid: Option<uuid::Uuid>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Row counts removed by one cascading activity delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeSummary {
    pub attendance_deleted: usize,
    pub applications_deleted: usize,
}

/// Repository interface for activity persistence and the enrollment ledger.
pub trait ActivityRepository {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId>;
    fn get_activity(&self, uuid: ActivityId) -> RepoResult<Option<Activity>>;
    fn list_activities(&self, query: &ActivityListQuery) -> RepoResult<Vec<Activity>>;
    /// Full-row update of every mutable column except `enrolled`.
    fn update_activity(&self, activity: &Activity) -> RepoResult<()>;
    /// Takes one seat; fails `CapacityExceeded` when the activity is full.
    fn increment_enrolled(&self, uuid: ActivityId) -> RepoResult<()>;
    /// Releases one seat, flooring at zero.
    fn decrement_enrolled(&self, uuid: ActivityId) -> RepoResult<()>;
    /// Deletes attendance, applications and the activity in FK order,
    /// all-or-nothing.
    fn delete_activity_cascade(&self, uuid: ActivityId) -> RepoResult<CascadeSummary>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId> {
        activity.validate()?;

        self.conn.execute(
            "INSERT INTO activities (
                uuid,
                title,
                description,
                category,
                location,
                starts_at,
                capacity,
                enrolled,
                owner_uuid,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                activity.uuid.to_string(),
                activity.title.as_str(),
                activity.description.as_str(),
                activity.category.as_str(),
                activity.location.as_deref(),
                activity.starts_at,
                activity.capacity,
                activity.enrolled,
                activity.owner_uuid.to_string(),
                activity.status.as_str(),
            ],
        )?;

        Ok(activity.uuid)
    }

    fn get_activity(&self, uuid: ActivityId) -> RepoResult<Option<Activity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_activity_row(row)?));
        }
        Ok(None)
    }

    fn list_activities(&self, query: &ActivityListQuery) -> RepoResult<Vec<Activity>> {
        let mut sql = format!("{ACTIVITY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(owner) = query.owner_uuid {
            sql.push_str(" AND owner_uuid = ?");
            bind_values.push(Value::Text(owner.to_string()));
        }

        sql.push_str(" ORDER BY starts_at ASC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }

    fn update_activity(&self, activity: &Activity) -> RepoResult<()> {
        activity.validate()?;

        let changed = self.conn.execute(
            "UPDATE activities
             SET
                title = ?2,
                description = ?3,
                category = ?4,
                location = ?5,
                starts_at = ?6,
                capacity = ?7,
                owner_uuid = ?8,
                status = ?9,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                activity.uuid.to_string(),
                activity.title.as_str(),
                activity.description.as_str(),
                activity.category.as_str(),
                activity.location.as_deref(),
                activity.starts_at,
                activity.capacity,
                activity.owner_uuid.to_string(),
                activity.status.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "activities",
                uuid: activity.uuid,
            });
        }
        Ok(())
    }

    fn increment_enrolled(&self, uuid: ActivityId) -> RepoResult<()> {
        increment_enrolled_on(self.conn, uuid)
    }

    fn decrement_enrolled(&self, uuid: ActivityId) -> RepoResult<()> {
        decrement_enrolled_on(self.conn, uuid)
    }

    fn delete_activity_cascade(&self, uuid: ActivityId) -> RepoResult<CascadeSummary> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let uuid_text = uuid.to_string();

        let attendance_deleted = tx.execute(
            "DELETE FROM attendance
             WHERE application_uuid IN (
                SELECT uuid FROM applications WHERE activity_uuid = ?1
             );",
            [uuid_text.as_str()],
        )?;
        let applications_deleted = tx.execute(
            "DELETE FROM applications WHERE activity_uuid = ?1;",
            [uuid_text.as_str()],
        )?;
        let changed = tx.execute(
            "DELETE FROM activities WHERE uuid = ?1;",
            [uuid_text.as_str()],
        )?;

        if changed == 0 {
            // Drop of the uncommitted transaction rolls the earlier deletes back.
            return Err(RepoError::NotFound {
                entity: "activities",
                uuid,
            });
        }

        tx.commit()?;
        Ok(CascadeSummary {
            attendance_deleted,
            applications_deleted,
        })
    }
}

/// Conditional seat-take, shared with the application status transition so
/// the ledger SQL lives in exactly one place.
pub(crate) fn increment_enrolled_on(conn: &Connection, uuid: ActivityId) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE activities
         SET enrolled = enrolled + 1, updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1 AND enrolled < capacity;",
        [uuid.to_string()],
    )?;

    if changed == 0 {
        // A missing row and a full activity are indistinguishable above; one
        // existence probe decides which error to surface.
        if activity_exists(conn, uuid)? {
            return Err(RepoError::CapacityExceeded(uuid));
        }
        return Err(RepoError::NotFound {
            entity: "activities",
            uuid,
        });
    }
    Ok(())
}

/// Seat release, floored at zero.
pub(crate) fn decrement_enrolled_on(conn: &Connection, uuid: ActivityId) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE activities
         SET enrolled = MAX(enrolled - 1, 0), updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1;",
        [uuid.to_string()],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: "activities",
            uuid,
        });
    }
    Ok(())
}

fn activity_exists(conn: &Connection, uuid: ActivityId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM activities WHERE uuid = ?1);",
        [uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "activities.uuid")?;

    let owner_text: String = row.get("owner_uuid")?;
    let owner_uuid = parse_uuid(&owner_text, "activities.owner_uuid")?;

    let category_text: String = row.get("category")?;
    let category = ActivityCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in activities.category"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = ActivityStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in activities.status"))
    })?;

    let activity = Activity {
        uuid,
        title: row.get("title")?,
        description: row.get("description")?,
        category,
        location: row.get("location")?,
        starts_at: row.get("starts_at")?,
        capacity: row.get("capacity")?,
        enrolled: row.get("enrolled")?,
        owner_uuid,
        status,
    };
    activity.validate()?;
    Ok(activity)
}
