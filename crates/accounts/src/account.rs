//! The `Account` entity.
//!
//! # Invariants
//! - A new account always starts `is_active = false`, `is_approved = false`.
//! - A superuser account carries `role = Admin` on every persist; the
//!   submitted role never wins over the superuser flag.
//! - `is_active` and `is_approved` are independent booleans: verification
//!   does not require prior approval and vice versa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_auth::Role;
use gatehouse_core::AccountId;

/// A registered account, carrying both identity and authorization attributes.
///
/// There is no deletion path: once created, accounts persist indefinitely and
/// are only ever disabled via `is_active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; plaintext passwords are never stored.
    pub password_hash: String,
    pub role: Role,
    pub is_superuser: bool,
    /// "Email verified and not administratively disabled."
    pub is_active: bool,
    /// "Administrator has cleared this account for full use."
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a fresh account in its initial state (inactive, unapproved).
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        is_superuser: bool,
    ) -> Self {
        let mut account = Self {
            id: AccountId::new(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            is_superuser,
            is_active: false,
            is_approved: false,
            created_at: Utc::now(),
        };
        account.enforce_superuser_role();
        account
    }

    /// Superuser status always wins over any requested role.
    ///
    /// Store implementations call this on **every** write, not just creation,
    /// so the role can never be downgraded on a superuser account.
    pub fn enforce_superuser_role(&mut self) {
        if self.is_superuser {
            self.role = Role::Admin;
        }
    }

    /// Verified but not yet cleared by an administrator.
    pub fn is_pending(&self) -> bool {
        self.is_active && !self.is_approved
    }
}

/// Raw self-registration input, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Requested role; defaults to customer. Ignored for superusers (which
    /// cannot be created through self-registration anyway).
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_starts_inactive_and_unapproved() {
        let account = Account::new("alice", "alice@x.com", "$argon2id$stub", Role::Customer, false);
        assert!(!account.is_active);
        assert!(!account.is_approved);
        assert!(!account.is_pending());
    }

    #[test]
    fn superuser_role_is_forced_to_admin_at_creation() {
        let account = Account::new("root", "root@x.com", "$argon2id$stub", Role::Customer, true);
        assert_eq!(account.role, Role::Admin);
    }

    #[test]
    fn superuser_role_is_forced_back_after_mutation() {
        let mut account = Account::new("root", "root@x.com", "$argon2id$stub", Role::Admin, true);
        account.role = Role::Customer;
        account.enforce_superuser_role();
        assert_eq!(account.role, Role::Admin);
    }

    #[test]
    fn non_superuser_keeps_submitted_role() {
        let mut account = Account::new("bob", "bob@x.com", "$argon2id$stub", Role::Manager, false);
        account.enforce_superuser_role();
        assert_eq!(account.role, Role::Manager);
    }

    #[test]
    fn pending_means_active_but_unapproved() {
        let mut account = Account::new("carol", "carol@x.com", "$argon2id$stub", Role::Customer, false);
        account.is_active = true;
        assert!(account.is_pending());

        account.is_approved = true;
        assert!(!account.is_pending());
    }
}
