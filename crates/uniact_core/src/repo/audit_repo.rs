//! Audit log repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append audit entries and expose a recent-first read for operators.
//!
//! # Invariants
//! - The table is append-only from core's point of view; there is no update
//!   or delete API.

use crate::model::audit::{AuditEntry, AuditEntryId};
use crate::repo::{parse_opt_uuid, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const AUDIT_SELECT_SQL: &str = "SELECT
    uuid,
    action,
    actor_uuid,
    target_uuid,
    entity,
    entity_uuid,
    message,
    metadata,
    created_at
FROM audit_log";

/// Repository interface for the append-only audit trail.
pub trait AuditRepository {
    fn append(&self, entry: &AuditEntry) -> RepoResult<AuditEntryId>;
    fn list_recent(&self, limit: u32) -> RepoResult<Vec<AuditEntry>>;
}

/// SQLite-backed audit repository.
pub struct SqliteAuditRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuditRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuditRepository for SqliteAuditRepository<'_> {
    fn append(&self, entry: &AuditEntry) -> RepoResult<AuditEntryId> {
        let metadata = serde_json::to_string(&entry.metadata)
            .map_err(|err| RepoError::InvalidData(format!("unserializable metadata: {err}")))?;

        self.conn.execute(
            "INSERT INTO audit_log (
                uuid,
                action,
                actor_uuid,
                target_uuid,
                entity,
                entity_uuid,
                message,
                metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                entry.uuid.to_string(),
                entry.action.as_str(),
                entry.actor_uuid.map(|uuid| uuid.to_string()),
                entry.target_uuid.map(|uuid| uuid.to_string()),
                entry.entity.as_deref(),
                entry.entity_uuid.map(|uuid| uuid.to_string()),
                entry.message.as_str(),
                metadata,
            ],
        )?;

        Ok(entry.uuid)
    }

    fn list_recent(&self, limit: u32) -> RepoResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AUDIT_SELECT_SQL} ORDER BY created_at DESC, uuid ASC LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_audit_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_audit_row(row: &Row<'_>) -> RepoResult<AuditEntry> {
    let uuid_text: String = row.get("uuid")?;
    let metadata_text: String = row.get("metadata")?;
    let metadata = serde_json::from_str(&metadata_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid metadata JSON `{metadata_text}` in audit_log.metadata"
        ))
    })?;

    Ok(AuditEntry {
        uuid: parse_uuid(&uuid_text, "audit_log.uuid")?,
        action: row.get("action")?,
        actor_uuid: parse_opt_uuid(row.get("actor_uuid")?, "audit_log.actor_uuid")?,
        target_uuid: parse_opt_uuid(row.get("target_uuid")?, "audit_log.target_uuid")?,
        entity: row.get("entity")?,
        entity_uuid: parse_opt_uuid(row.get("entity_uuid")?, "audit_log.entity_uuid")?,
        message: row.get("message")?,
        metadata,
        created_at: row.get("created_at")?,
    })
}
