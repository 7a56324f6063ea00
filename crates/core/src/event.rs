//! Domain event contract.

use chrono::{DateTime, Utc};

/// Metadata every domain event exposes.
///
/// `event_type` is a stable, dotted identifier (e.g. `deal.status_changed`)
/// used as the `event` field of audit records.
pub trait DomainEvent {
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    fn occurred_at(&self) -> DateTime<Utc>;
}
