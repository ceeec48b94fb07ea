pub mod memory;
pub mod postgres;

pub use memory::InMemoryAuditLog;
pub use postgres::PostgresAuditLogReader;
