//! `gatehouse-infra` — implementations of the account lifecycle's external
//! collaborators: credential stores (in-memory and Postgres), audit log
//! readers, and notifiers (SMTP and tracing-only).

pub mod audit;
pub mod notify;
pub mod store;


pub use audit::{InMemoryAuditLog, PostgresAuditLogReader};
pub use notify::{SmtpConfig, SmtpNotifier, TracingNotifier};
pub use store::{InMemoryAccountStore, PostgresAccountStore};
