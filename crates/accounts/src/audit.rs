//! Read-only view over the external audit trail.
//!
//! The audit log is produced elsewhere; this system only queries it, keyed by
//! account id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::AccountId;

use crate::store::StoreError;

/// Kind of change an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Addition,
    Change,
    Deletion,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Addition => "addition",
            AuditAction::Change => "change",
            AuditAction::Deletion => "deletion",
        }
    }
}

/// One account-affecting action from the external audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub recorded_at: DateTime<Utc>,
    pub action: AuditAction,
    pub change_message: String,
    /// Kind of entity the action affected (e.g. "account").
    pub entity_kind: String,
}

#[async_trait]
pub trait AuditLogReader: Send + Sync {
    /// Entries affecting the given account, oldest first.
    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<AuditEntry>, StoreError>;
}
