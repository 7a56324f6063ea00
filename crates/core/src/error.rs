//! Engine error model.

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::id::AccountId;
use crate::money::Money;

/// Result type used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error.
///
/// Every variant maps to a stable machine-readable code (see [`EngineError::kind`]).
/// Business-rule variants are raised before any mutation is staged, so callers
/// never observe partial state when they receive one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Unknown deal, condition, transaction or account.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input or a missing required field.
    #[error("validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Requested status change is not in the transition table.
    #[error("invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// A condition blocks the requested transition.
    #[error("condition {condition_id} ({condition_type}) is not satisfied")]
    ConditionNotSatisfied {
        condition_id: String,
        condition_type: String,
    },

    /// The operation is not allowed in the entity's current status.
    #[error("operation `{operation}` is not permitted while {status}")]
    NotPermitted { operation: String, status: String },

    /// Completed deposits/payments do not cover the offer price.
    #[error("incomplete funding: required {required}, funded {funded}")]
    IncompleteFunding { required: Money, funded: Money },

    /// A debit would take the account balance below zero.
    #[error("insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Money,
        requested: Money,
    },

    #[error("account {0} is frozen")]
    AccountFrozen(AccountId),

    #[error("account {0} is closed")]
    AccountClosed(AccountId),

    /// Lock timeout or stale version; safe to retry.
    #[error("contention: {0}")]
    Contention(String),

    /// Internal consistency check failed.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Durable journal failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn not_permitted(operation: impl Into<String>, status: impl ToString) -> Self {
        Self::NotPermitted {
            operation: operation.into(),
            status: status.to_string(),
        }
    }

    pub fn contention(msg: impl Into<String>) -> Self {
        Self::Contention(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation_error",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::ConditionNotSatisfied { .. } => "condition_not_satisfied",
            Self::NotPermitted { .. } => "operation_not_permitted",
            Self::IncompleteFunding { .. } => "incomplete_funding",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::AccountFrozen(_) => "account_frozen",
            Self::AccountClosed(_) => "account_closed",
            Self::Contention(_) => "contention",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::Storage(_) => "storage_error",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention(_))
    }

    /// Account or deal-policy rejection raised while posting money.
    ///
    /// A pending transaction that hits one of these on completion is moved to
    /// `failed` instead of surfacing an error.
    pub fn is_posting_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::AccountFrozen(_)
                | Self::AccountClosed(_)
                | Self::NotPermitted { .. }
        )
    }

    /// Structured detail payload for API responses and logs.
    pub fn details(&self) -> JsonValue {
        match self {
            Self::NotFound { entity, id } => json!({ "entity": entity, "id": id }),
            Self::Validation { field, .. } => json!({ "field": field }),
            Self::InvalidTransition { entity, from, to } => {
                json!({ "entity": entity, "current": from, "requested": to })
            }
            Self::ConditionNotSatisfied {
                condition_id,
                condition_type,
            } => json!({ "condition_id": condition_id, "condition_type": condition_type }),
            Self::NotPermitted { operation, status } => {
                json!({ "operation": operation, "status": status })
            }
            Self::IncompleteFunding { required, funded } => {
                json!({ "required": required, "funded": funded })
            }
            Self::InsufficientFunds {
                account_id,
                balance,
                requested,
            } => json!({ "account_id": account_id, "balance": balance, "requested": requested }),
            Self::AccountFrozen(id) | Self::AccountClosed(id) => json!({ "account_id": id }),
            Self::Contention(_) => json!({ "retryable": true }),
            Self::InvariantViolation(_) | Self::Storage(_) => json!({}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_contention_is_retryable() {
        assert!(EngineError::contention("lock timeout").is_retryable());
        assert!(!EngineError::invariant("mismatch").is_retryable());
        assert!(!EngineError::validation("amount", "must be positive").is_retryable());
    }

    #[test]
    fn details_carry_money_as_decimal_strings() {
        let err = EngineError::IncompleteFunding {
            required: Money::from_minor(50_000_000),
            funded: Money::from_minor(1_250),
        };
        assert_eq!(err.kind(), "incomplete_funding");
        assert_eq!(
            err.details(),
            json!({ "required": "500000.00", "funded": "12.50" })
        );
    }

    #[test]
    fn display_names_current_and_requested_status() {
        let err = EngineError::invalid_transition("deal", "draft", "firm");
        assert_eq!(err.to_string(), "invalid deal transition from draft to firm");
    }
}
