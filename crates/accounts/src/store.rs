//! Credential store contract.

use async_trait::async_trait;
use thiserror::Error;

use gatehouse_core::AccountId;

use crate::account::Account;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("account not found")]
    NotFound,

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Durable keyed store for accounts.
///
/// Uniqueness of `username` and `email` is enforced here. Implementations
/// must apply [`Account::enforce_superuser_role`] on **every** write (insert
/// and update), mirroring the save-path role override invariant.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account. Fails with a duplicate error if the username or
    /// email is already taken.
    async fn insert(&self, account: Account) -> Result<Account, StoreError>;

    /// Persist changes to an existing account.
    async fn update(&self, account: Account) -> Result<Account, StoreError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// All accounts with `is_active = true, is_approved = false`.
    async fn list_pending(&self) -> Result<Vec<Account>, StoreError>;
}
