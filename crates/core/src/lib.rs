//! `closingdesk-core` — shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, fixed-point money, the engine error model, the aggregate
//! execution traits and the append-only log used for histories.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod id;
pub mod log;
pub mod money;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{EngineError, EngineResult};
pub use event::DomainEvent;
pub use id::{AccountId, ConditionId, DealId, PropertyId, TransactionId, UserId};
pub use log::AppendOnlyLog;
pub use money::Money;
