//! Fire-and-forget audit trail recorder.
//!
//! # Responsibility
//! - Append one audit entry per recorded action, isolating every underlying
//!   failure from the triggering operation.
//!
//! # Invariants
//! - `record` never returns an error; a failed append yields `None` plus one
//!   warn event. Audit completeness is best-effort, not transactional with
//!   the business operation it describes.

use crate::model::audit::{AuditEntry, AuditEntryId};
use crate::repo::audit_repo::AuditRepository;
use crate::service::side_effect::run_best_effort;

/// Best-effort writer for the append-only audit trail.
pub struct AuditRecorder<LR> {
    log: LR,
}

impl<LR: AuditRepository> AuditRecorder<LR> {
    pub fn new(log: LR) -> Self {
        Self { log }
    }

    /// Appends the entry; on any store failure returns `None`.
    pub fn record(&self, entry: AuditEntry) -> Option<AuditEntryId> {
        run_best_effort("audit_record", || self.log.append(&entry))
    }
}

#[cfg(test)]
mod tests {
    use super::AuditRecorder;
    use crate::model::audit::{actions, AuditEntry, AuditEntryId};
    use crate::repo::audit_repo::AuditRepository;
    use crate::repo::{RepoError, RepoResult};
    use std::cell::RefCell;

    struct FailingAuditRepository;

    impl AuditRepository for FailingAuditRepository {
        fn append(&self, _entry: &AuditEntry) -> RepoResult<AuditEntryId> {
            Err(RepoError::InvalidData("sink offline".to_string()))
        }

        fn list_recent(&self, _limit: u32) -> RepoResult<Vec<AuditEntry>> {
            Ok(Vec::new())
        }
    }

    struct CollectingAuditRepository {
        entries: RefCell<Vec<AuditEntry>>,
    }

    impl AuditRepository for CollectingAuditRepository {
        fn append(&self, entry: &AuditEntry) -> RepoResult<AuditEntryId> {
            self.entries.borrow_mut().push(entry.clone());
            Ok(entry.uuid)
        }

        fn list_recent(&self, _limit: u32) -> RepoResult<Vec<AuditEntry>> {
            Ok(self.entries.borrow().clone())
        }
    }

    #[test]
    fn record_returns_entry_id_on_success() {
        let recorder = AuditRecorder::new(CollectingAuditRepository {
            entries: RefCell::new(Vec::new()),
        });
        let entry = AuditEntry::new(actions::ACTIVITY_CREATE, "created");
        let expected = entry.uuid;

        assert_eq!(recorder.record(entry), Some(expected));
    }

    #[test]
    fn record_swallows_store_failure() {
        let recorder = AuditRecorder::new(FailingAuditRepository);
        let entry = AuditEntry::new(actions::ACTIVITY_CREATE, "created");

        assert_eq!(recorder.record(entry), None);
    }
}
