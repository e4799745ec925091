//! Audit trail domain model.
//!
//! # Responsibility
//! - Define the append-only audit entry and the known action identifiers.
//!
//! # Invariants
//! - Entries are never updated or deleted by core code.
//! - `action` values are free-form strings; the constants below cover every
//!   action core emits itself.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for audit entries.
pub type AuditEntryId = Uuid;

/// Action identifiers emitted by core services.
pub mod actions {
    pub const ACTIVITY_CREATE: &str = "ACTIVITY_CREATE";
    pub const ACTIVITY_UPDATE: &str = "ACTIVITY_UPDATE";
    pub const ACTIVITY_DELETE: &str = "ACTIVITY_DELETE";
    pub const APPLICATION_SUBMIT: &str = "APPLICATION_SUBMIT";
    pub const APPLICATION_STATUS: &str = "APPLICATION_STATUS";
    pub const APPLICATION_DELETE: &str = "APPLICATION_DELETE";
    pub const USER_REGISTER: &str = "USER_REGISTER";
    pub const USER_STATUS_TOGGLE: &str = "USER_STATUS_TOGGLE";
    pub const PASSWORD_CHANGE: &str = "PASSWORD_CHANGE";
    pub const LOGIN_FAILURE: &str = "LOGIN_FAILURE";
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub uuid: AuditEntryId,
    pub action: String,
    /// Acting account, when the action has an authenticated actor.
    pub actor_uuid: Option<UserId>,
    /// Account the action was performed on, when distinct from the actor.
    pub target_uuid: Option<UserId>,
    /// Entity table name, e.g. `activities`.
    pub entity: Option<String>,
    pub entity_uuid: Option<Uuid>,
    pub message: String,
    /// Opaque structured context, stored as JSON text.
    pub metadata: serde_json::Value,
    /// Insert timestamp in epoch milliseconds, assigned by storage.
    pub created_at: i64,
}

impl AuditEntry {
    /// Creates an entry with a generated id and empty context.
    pub fn new(action: &str, message: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            action: action.to_string(),
            actor_uuid: None,
            target_uuid: None,
            entity: None,
            entity_uuid: None,
            message: message.into(),
            metadata: serde_json::Value::Null,
            created_at: 0,
        }
    }

    pub fn actor(mut self, actor_uuid: UserId) -> Self {
        self.actor_uuid = Some(actor_uuid);
        self
    }

    pub fn target(mut self, target_uuid: UserId) -> Self {
        self.target_uuid = Some(target_uuid);
        self
    }

    pub fn entity(mut self, entity: &str, entity_uuid: Uuid) -> Self {
        self.entity = Some(entity.to_string());
        self.entity_uuid = Some(entity_uuid);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{actions, AuditEntry};
    use uuid::Uuid;

    #[test]
    fn builder_fills_optional_context() {
        let actor = Uuid::new_v4();
        let entity_id = Uuid::new_v4();
        let entry = AuditEntry::new(actions::ACTIVITY_CREATE, "created")
            .actor(actor)
            .entity("activities", entity_id)
            .metadata(serde_json::json!({ "capacity": 10 }));

        assert_eq!(entry.action, "ACTIVITY_CREATE");
        assert_eq!(entry.actor_uuid, Some(actor));
        assert_eq!(entry.entity.as_deref(), Some("activities"));
        assert_eq!(entry.entity_uuid, Some(entity_id));
        assert_eq!(entry.metadata["capacity"], 10);
        assert!(entry.target_uuid.is_none());
    }
}
