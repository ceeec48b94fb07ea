//! Account lifecycle controller.
//!
//! Enforces the legal state transitions (registration → email verification →
//! approval → active/inactive) and nothing else: persistence, token signing,
//! and delivery are delegated to the collaborators passed in at construction.
//! There is no hidden process-wide state; everything is an explicit argument.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use gatehouse_core::AccountId;

use crate::account::{Account, NewRegistration};
use crate::audit::{AuditEntry, AuditLogReader};
use crate::link;
use crate::notifier::{EmailMessage, Notifier};
use crate::password::{self, PasswordError};
use crate::store::{AccountStore, StoreError};
use crate::token::VerificationTokenService;

/// Per-field validation problems: every invalid field appears with the full
/// list of its problems, so a caller can surface them all at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("invalid link")]
    InvalidLink,

    #[error("invalid token")]
    InvalidToken,

    #[error("account not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => LifecycleError::NotFound,
            // Uniqueness races slip past the pre-insert checks; report them
            // the same way as any other duplicate.
            StoreError::DuplicateUsername => {
                LifecycleError::Validation(FieldErrors::single("username", "already taken"))
            }
            StoreError::DuplicateEmail => {
                LifecycleError::Validation(FieldErrors::single("email", "already registered"))
            }
            other => LifecycleError::Store(other),
        }
    }
}

impl From<PasswordError> for LifecycleError {
    fn from(err: PasswordError) -> Self {
        LifecycleError::Internal(err.to_string())
    }
}

/// Result of a registration: the created account plus whether the
/// verification email actually went out.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub account: Account,
    pub email_sent: bool,
}

pub struct AccountLifecycle {
    store: Arc<dyn AccountStore>,
    tokens: Arc<dyn VerificationTokenService>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditLogReader>,
    public_base_url: String,
    notify_timeout: Duration,
}

impl AccountLifecycle {
    const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(
        store: Arc<dyn AccountStore>,
        tokens: Arc<dyn VerificationTokenService>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditLogReader>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tokens,
            notifier,
            audit,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            notify_timeout: Self::DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    /// Self-registration (unauthenticated).
    ///
    /// Creates the account inactive and unapproved, then sends the
    /// verification link best-effort: a notifier failure is logged and
    /// reported via `email_sent`, never surfaced as an error. An email outage
    /// must not roll back account creation.
    pub async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<RegistrationOutcome, LifecycleError> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_lowercase();

        let mut errors = FieldErrors::default();
        if username.is_empty() {
            errors.add("username", "this field is required");
        }
        if email.is_empty() {
            errors.add("email", "this field is required");
        } else if !email.contains('@') {
            errors.add("email", "enter a valid email address");
        }
        if registration.password.is_empty() {
            errors.add("password", "this field is required");
        }

        if !username.is_empty() && self.store.find_by_username(&username).await?.is_some() {
            errors.add("username", "already taken");
        }
        if !email.is_empty() && self.store.find_by_email(&email).await?.is_some() {
            errors.add("email", "already registered");
        }

        if !errors.is_empty() {
            return Err(LifecycleError::Validation(errors));
        }

        let password_hash = password::hash_password(&registration.password)?;
        let account = Account::new(
            username,
            email,
            password_hash,
            registration.role.unwrap_or_default(),
            false,
        );
        let account = self.store.insert(account).await?;
        tracing::info!(account_id = %account.id, "account registered");

        let email_sent = self.send_verification_email(&account).await;
        Ok(RegistrationOutcome {
            account,
            email_sent,
        })
    }

    async fn send_verification_email(&self, account: &Account) -> bool {
        let token = match self.tokens.issue(account) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "could not issue verification token");
                return false;
            }
        };

        let link = format!(
            "{}/accounts/verify-email/{}/{}",
            self.public_base_url,
            link::encode_account_id(account.id),
            token
        );
        let message = EmailMessage {
            to: account.email.clone(),
            subject: "Verify your email".to_string(),
            body: format!(
                "Hi {}, click the link to verify your email: {}",
                account.username, link
            ),
        };

        // Bounded and best-effort: delivery latency must not hold the
        // registration response hostage.
        match tokio::time::timeout(self.notify_timeout, self.notifier.send(&message)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(account_id = %account.id, error = %e, "verification email failed to send");
                false
            }
            Err(_) => {
                tracing::warn!(account_id = %account.id, "verification email timed out");
                false
            }
        }
    }

    /// Email verification (unauthenticated).
    ///
    /// The encoded id decodes to an account or the link is invalid; the token
    /// is then checked against that account under the token service's
    /// single-use/time-limited contract.
    pub async fn verify_email(
        &self,
        encoded_id: &str,
        token: &str,
    ) -> Result<Account, LifecycleError> {
        let id = link::decode_account_id(encoded_id).map_err(|_| LifecycleError::InvalidLink)?;
        let mut account = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::InvalidLink)?;

        if !self.tokens.validate(&account, token) {
            return Err(LifecycleError::InvalidToken);
        }

        account.is_active = true;
        let account = self.store.update(account).await?;
        tracing::info!(account_id = %account.id, "email verified");
        Ok(account)
    }

    /// Accounts awaiting administrative approval (`is_active && !is_approved`).
    pub async fn pending_accounts(&self) -> Result<Vec<Account>, LifecycleError> {
        Ok(self.store.list_pending().await?)
    }

    pub async fn approve(&self, id: AccountId) -> Result<Account, LifecycleError> {
        let mut account = self.load(id).await?;
        account.is_approved = true;
        let account = self.store.update(account).await?;
        tracing::info!(account_id = %account.id, "account approved");
        Ok(account)
    }

    pub async fn reject(&self, id: AccountId) -> Result<Account, LifecycleError> {
        let mut account = self.load(id).await?;
        account.is_active = false;
        let account = self.store.update(account).await?;
        tracing::info!(account_id = %account.id, "account rejected");
        Ok(account)
    }

    /// Flip `is_active`; the returned account carries the resulting state.
    pub async fn toggle_status(&self, id: AccountId) -> Result<Account, LifecycleError> {
        let mut account = self.load(id).await?;
        account.is_active = !account.is_active;
        let account = self.store.update(account).await?;
        tracing::info!(
            account_id = %account.id,
            is_active = account.is_active,
            "account status toggled"
        );
        Ok(account)
    }

    /// Administrative password reset: overwrite the hash with a fresh one.
    pub async fn reset_password(
        &self,
        id: AccountId,
        new_password: &str,
    ) -> Result<Account, LifecycleError> {
        let mut account = self.load(id).await?;

        if new_password.is_empty() {
            return Err(LifecycleError::Validation(FieldErrors::single(
                "new_password",
                "new password is required",
            )));
        }

        account.password_hash = password::hash_password(new_password)?;
        let account = self.store.update(account).await?;
        tracing::info!(account_id = %account.id, "password reset");
        Ok(account)
    }

    /// External audit trail for an account, verifying the account exists first.
    pub async fn audit_trail(&self, id: AccountId) -> Result<Vec<AuditEntry>, LifecycleError> {
        self.load(id).await?;
        Ok(self.audit.entries_for(id).await?)
    }

    async fn load(&self, id: AccountId) -> Result<Account, LifecycleError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound)
    }
}
