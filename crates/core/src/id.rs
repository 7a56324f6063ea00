//! Strongly-typed identifiers used across the engine.
//!
//! Catalog entities (deals, properties, users, conditions) use opaque string
//! identifiers. Ledger entities (trust accounts, transactions) use integer
//! identifiers allocated by the store.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Identifier of a deal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DealId(String);

/// Identifier of a property (owned by the external catalog).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyId(String);

/// Identifier of a user (actor identity or deal participant).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Identifier of a condition, unique within its deal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConditionId(String);

macro_rules! impl_string_id {
    ($t:ident, $name:literal) => {
        impl $t {
            /// Parse an opaque identifier; blank strings are rejected.
            pub fn parse(value: impl Into<String>) -> Result<Self, EngineError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(EngineError::validation($name, "identifier must not be blank"));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = EngineError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_string_id!(DealId, "deal_id");
impl_string_id!(PropertyId, "property_id");
impl_string_id!(UserId, "user_id");
impl_string_id!(ConditionId, "condition_id");

impl DealId {
    /// Generate a fresh, time-ordered identifier (UUIDv7).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

impl ConditionId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

/// Identifier of a trust account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

/// Identifier of a ledger transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(i64);

macro_rules! impl_int_id {
    ($t:ident, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $t {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| EngineError::validation($name, e.to_string()))
            }
        }
    };
}

impl_int_id!(AccountId, "account_id");
impl_int_id!(TransactionId, "transaction_id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_string_ids_are_rejected() {
        let err = DealId::parse("   ").unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }

    #[test]
    fn string_ids_are_trimmed_and_round_trip_as_plain_strings() {
        let id = PropertyId::parse(" prop-17 ").unwrap();
        assert_eq!(id.as_str(), "prop-17");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"prop-17\"");
    }

    #[test]
    fn generated_deal_ids_are_unique() {
        assert_ne!(DealId::generate(), DealId::generate());
    }

    #[test]
    fn integer_ids_parse_from_path_segments() {
        assert_eq!("42".parse::<AccountId>().unwrap(), AccountId::new(42));
        assert!("abc".parse::<TransactionId>().is_err());
    }
}
