//! Engine: deal lifecycle and trust ledger operations over an [`EngineStore`].
//!
//! Every operation is one unit of work and runs the same pipeline:
//!
//! ```text
//! acquire locks (deal, then accounts ascending)
//!   ↓
//! load current entities from the store
//!   ↓
//! handle command (pure decision, produces events)
//!   ↓
//! apply events to copies; build one audit record per event
//!   ↓
//! commit post-images + audit records atomically (optimistic version check)
//! ```
//!
//! Business errors surface before the commit, so a rejected operation leaves
//! no trace. Lock timeouts and stale versions fail with `Contention`, which the
//! engine retries a bounded number of times.

use closingdesk_core::{Aggregate, AccountId, DealId, EngineError, EngineResult, TransactionId};
use closingdesk_deals::Deal;
use closingdesk_ledger::{Transaction, TrustAccount};

use crate::config::EngineConfig;
use crate::locks::LockTable;
use crate::retry::RetryPolicy;
use crate::store::{EngineStore, InMemoryStore};

pub mod accounts;
pub mod audit;
pub mod deals;
pub mod transactions;

pub use accounts::{AccountChanges, NewAccount};
pub use deals::{ConditionSpec, DealChanges, NewDeal};
pub use transactions::{CompletionOutcome, NewTransaction};

/// One applied event with the aggregate state around it.
#[derive(Debug, Clone)]
pub(crate) struct Step<A: Aggregate> {
    pub before: A,
    pub event: A::Event,
    pub after: A,
}

/// Handle `command` against `current` and apply the resulting events to a copy.
///
/// An empty step list means the command was an accepted no-op.
pub(crate) fn execute<A>(current: &A, command: &A::Command) -> EngineResult<(A, Vec<Step<A>>)>
where
    A: Aggregate<Error = EngineError> + Clone,
{
    let events = current.handle(command)?;

    let mut state = current.clone();
    let mut steps = Vec::with_capacity(events.len());
    for event in events {
        let before = state.clone();
        state.apply(&event);
        steps.push(Step {
            before,
            event,
            after: state.clone(),
        });
    }
    Ok((state, steps))
}

/// Log an operation's failure at the level its kind calls for.
fn observe<T>(operation: &'static str, result: EngineResult<T>) -> EngineResult<T> {
    if let Err(err) = &result {
        match err {
            EngineError::InvariantViolation(_) | EngineError::Storage(_) => {
                tracing::error!(operation, kind = err.kind(), error = %err, "operation aborted");
            }
            EngineError::Contention(_) => {
                tracing::warn!(operation, error = %err, "contention retries exhausted");
            }
            _ => {
                tracing::info!(operation, kind = err.kind(), error = %err, "operation rejected");
            }
        }
    }
    result
}

/// Deal and ledger engine.
#[derive(Debug)]
pub struct Engine<S = InMemoryStore> {
    store: S,
    deal_locks: LockTable<DealId>,
    account_locks: LockTable<AccountId>,
    retry: RetryPolicy,
}

impl Engine<InMemoryStore> {
    /// Engine over an in-memory store, journaled when `journal_path` is set.
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let store = match &config.journal_path {
            Some(path) => InMemoryStore::open(path)?,
            None => InMemoryStore::new(),
        };
        Ok(Self::new(store, config))
    }
}

impl<S: EngineStore> Engine<S> {
    pub fn new(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            deal_locks: LockTable::new("deal", config.lock_timeout),
            account_locks: LockTable::new("account", config.lock_timeout),
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn hold_deal_lock(
        &self,
        id: &DealId,
    ) -> EngineResult<crate::locks::LockGuard<'_, DealId>> {
        self.deal_locks.acquire(id)
    }

    fn run<T, F>(&self, operation: &'static str, op: F) -> EngineResult<T>
    where
        F: FnMut() -> EngineResult<T>,
    {
        observe(operation, self.retry.run(operation, op))
    }

    fn require_deal(&self, id: &DealId) -> EngineResult<Deal> {
        self.store
            .load_deal(id)?
            .ok_or_else(|| EngineError::not_found("deal", id))
    }

    fn require_account(&self, id: AccountId) -> EngineResult<TrustAccount> {
        self.store
            .load_account(id)?
            .ok_or_else(|| EngineError::not_found("trust_account", id))
    }

    fn require_transaction(&self, id: TransactionId) -> EngineResult<Transaction> {
        self.store
            .load_transaction(id)?
            .ok_or_else(|| EngineError::not_found("transaction", id))
    }
}
