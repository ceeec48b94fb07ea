//! Postgres-backed account store.
//!
//! Expects the `accounts` table from `schema.sql` at the crate root.
//! Username/email uniqueness lives in the database; unique-violation errors
//! (SQLSTATE 23505) are mapped back to the duplicate variants by constraint
//! name.

use core::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gatehouse_accounts::{Account, AccountStore, StoreError};
use gatehouse_auth::Role;
use gatehouse_core::AccountId;

#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            return match db.constraint() {
                Some("accounts_username_key") => StoreError::DuplicateUsername,
                Some("accounts_email_key") => StoreError::DuplicateEmail,
                _ => StoreError::Backend(db.to_string()),
            };
        }
    }
    StoreError::Backend(err.to_string())
}

fn row_to_account(row: &PgRow) -> Result<Account, StoreError> {
    let role: String = row
        .try_get("role")
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    let role = Role::from_str(&role).map_err(|e| StoreError::Backend(e.to_string()))?;

    Ok(Account {
        id: AccountId::from_uuid(
            row.try_get("id")
                .map_err(|e| StoreError::Backend(e.to_string()))?,
        ),
        username: row
            .try_get("username")
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        email: row
            .try_get("email")
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        role,
        is_superuser: row
            .try_get("is_superuser")
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        is_active: row
            .try_get("is_active")
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        is_approved: row
            .try_get("is_approved")
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| StoreError::Backend(e.to_string()))?,
    })
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    async fn insert(&self, mut account: Account) -> Result<Account, StoreError> {
        account.enforce_superuser_role();

        sqlx::query(
            r#"
            INSERT INTO accounts
                (id, username, email, password_hash, role,
                 is_superuser, is_active, is_approved, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_superuser)
        .bind(account.is_active)
        .bind(account.is_approved)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(account)
    }

    #[instrument(skip(self, account), fields(account_id = %account.id))]
    async fn update(&self, mut account: Account) -> Result<Account, StoreError> {
        account.enforce_superuser_role();

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2,
                email = $3,
                password_hash = $4,
                role = $5,
                is_superuser = $6,
                is_active = $7,
                is_approved = $8
            WHERE id = $1
            "#,
        )
        .bind(*account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_superuser)
        .bind(account.is_active)
        .bind(account.is_approved)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(account)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn list_pending(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM accounts
            WHERE is_active = TRUE AND is_approved = FALSE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_account).collect()
    }
}
