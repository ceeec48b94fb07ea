//! `gatehouse-accounts` — the account lifecycle.
//!
//! This crate owns the one piece of real design in the system: the legal
//! state transitions of an [`Account`] (registration → email verification →
//! administrative approval → active/inactive) and the contracts of the
//! external collaborators those transitions lean on (credential store,
//! verification tokens, notifier, audit trail).

pub mod account;
pub mod audit;
pub mod lifecycle;
pub mod link;
pub mod notifier;
pub mod password;
pub mod store;
pub mod token;

pub use account::{Account, NewRegistration};
pub use audit::{AuditAction, AuditEntry, AuditLogReader};
pub use lifecycle::{AccountLifecycle, FieldErrors, LifecycleError, RegistrationOutcome};
pub use notifier::{EmailMessage, Notifier, NotifyError};
pub use store::{AccountStore, StoreError};
pub use token::{Hs256VerificationTokens, VerificationTokenService};
