use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use closingdesk_core::{EngineError, UserId};

/// Kind of entity an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Deal,
    Condition,
    Transaction,
    TrustAccount,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Deal => "deal",
            EntityType::Condition => "condition",
            EntityType::Transaction => "transaction",
            EntityType::TrustAccount => "trust_account",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            EntityType::Deal,
            EntityType::Condition,
            EntityType::Transaction,
            EntityType::TrustAccount,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
        .ok_or_else(|| EngineError::validation("entity_type", format!("unknown entity type `{s}`")))
    }
}

/// An audit record ready to be committed (no sequence number yet).
///
/// Built by the engine for every domain event of a unit of work and handed
/// to the store together with the entity post-images it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedAuditRecord {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub event: String,
    /// `null` when the entity did not exist before the event.
    pub before: JsonValue,
    pub after: JsonValue,
    pub timestamp: DateTime<Utc>,
    pub actor_id: UserId,
}

/// A committed, immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Position in the global audit log (1-based, gap-free).
    pub sequence: u64,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub event: String,
    pub before: JsonValue,
    pub after: JsonValue,
    pub timestamp: DateTime<Utc>,
    pub actor_id: UserId,
}

impl AuditRecord {
    pub fn commit(sequence: u64, record: UncommittedAuditRecord) -> Self {
        Self {
            sequence,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            event: record.event,
            before: record.before,
            after: record.after,
            timestamp: record.timestamp,
            actor_id: record.actor_id,
        }
    }
}
