//! Audit log: immutable records of every state-changing event.

pub mod log;
pub mod query;
pub mod record;

pub use log::AuditLog;
pub use query::{AuditFilter, AuditPage, AuditQuery, Pagination};
pub use record::{AuditRecord, EntityType, UncommittedAuditRecord};
