//! Infrastructure layer: engine orchestration, locking, storage and config.

pub mod config;
pub mod engine;
pub mod locks;
pub mod retry;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, EngineConfig};
pub use engine::{
    AccountChanges, CompletionOutcome, ConditionSpec, DealChanges, Engine, NewAccount, NewDeal,
    NewTransaction,
};
pub use store::{DealFilter, EngineStore, InMemoryStore, TransactionFilter};
