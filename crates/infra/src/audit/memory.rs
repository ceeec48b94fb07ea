use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use gatehouse_accounts::{AuditEntry, AuditLogReader, StoreError};
use gatehouse_core::AccountId;

/// In-memory audit trail for tests/dev.
///
/// Real deployments read an externally-populated table; this one lets tests
/// seed entries directly.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<HashMap<AccountId, Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, account_id: AccountId, entry: AuditEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.entry(account_id).or_default().push(entry);
        }
    }
}

#[async_trait]
impl AuditLogReader for InMemoryAuditLog {
    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<AuditEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Backend("audit log lock poisoned".to_string()))?;
        Ok(entries.get(&account_id).cloned().unwrap_or_default())
    }
}
