//! Read-only audit trail queries against the external `audit_log` table.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use gatehouse_accounts::{AuditAction, AuditEntry, AuditLogReader, StoreError};
use gatehouse_core::AccountId;

#[derive(Debug, Clone)]
pub struct PostgresAuditLogReader {
    pool: PgPool,
}

impl PostgresAuditLogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_action(raw: &str) -> Result<AuditAction, StoreError> {
    match raw {
        "addition" => Ok(AuditAction::Addition),
        "change" => Ok(AuditAction::Change),
        "deletion" => Ok(AuditAction::Deletion),
        other => Err(StoreError::Backend(format!(
            "unknown audit action {other:?}"
        ))),
    }
}

#[async_trait]
impl AuditLogReader for PostgresAuditLogReader {
    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<AuditEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT recorded_at, action, change_message, entity_kind
            FROM audit_log
            WHERE account_id = $1
            ORDER BY recorded_at
            "#,
        )
        .bind(*account_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let action: String = row
                    .try_get("action")
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(AuditEntry {
                    recorded_at: row
                        .try_get("recorded_at")
                        .map_err(|e| StoreError::Backend(e.to_string()))?,
                    action: parse_action(&action)?,
                    change_message: row
                        .try_get("change_message")
                        .map_err(|e| StoreError::Backend(e.to_string()))?,
                    entity_kind: row
                        .try_get("entity_kind")
                        .map_err(|e| StoreError::Backend(e.to_string()))?,
                })
            })
            .collect()
    }
}
