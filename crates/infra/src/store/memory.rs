use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use gatehouse_accounts::{Account, AccountStore, StoreError};
use gatehouse_core::AccountId;

/// In-memory account store.
///
/// Intended for tests/dev. Uniqueness checks and writes happen under a single
/// write lock, which gives the same single-record atomicity the Postgres
/// store gets from one-statement writes.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        accounts: &HashMap<AccountId, Account>,
        candidate: &Account,
    ) -> Result<(), StoreError> {
        for existing in accounts.values() {
            if existing.id == candidate.id {
                continue;
            }
            if existing.username == candidate.username {
                return Err(StoreError::DuplicateUsername);
            }
            if existing.email == candidate.email {
                return Err(StoreError::DuplicateEmail);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, mut account: Account) -> Result<Account, StoreError> {
        account.enforce_superuser_role();

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::Backend("account store lock poisoned".to_string()))?;

        Self::check_unique(&accounts, &account)?;
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, mut account: Account) -> Result<Account, StoreError> {
        account.enforce_superuser_role();

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::Backend("account store lock poisoned".to_string()))?;

        if !accounts.contains_key(&account.id) {
            return Err(StoreError::NotFound);
        }
        Self::check_unique(&accounts, &account)?;
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::Backend("account store lock poisoned".to_string()))?;
        Ok(accounts.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::Backend("account store lock poisoned".to_string()))?;
        Ok(accounts.values().find(|a| a.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::Backend("account store lock poisoned".to_string()))?;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn list_pending(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::Backend("account store lock poisoned".to_string()))?;
        let mut pending: Vec<Account> = accounts
            .values()
            .filter(|a| a.is_pending())
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; ids are time-ordered (v7).
        pending.sort_by_key(|a| *a.id.as_uuid());
        Ok(pending)
    }
}
