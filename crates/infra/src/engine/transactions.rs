use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use closingdesk_core::{
    AccountId, AggregateRoot, DealId, EngineError, EngineResult, Money, TransactionId, UserId,
};
use closingdesk_ledger::{
    ensure_deal_accepts, lock_order, CompleteTransaction, CreateTransaction, FailTransaction,
    Posting, ReverseTransaction, Transaction, TransactionCommand, TransactionType, TrustAccount,
};

use super::{audit, execute, Engine};
use crate::store::{EngineStore, TransactionFilter, UnitOfWork};

/// Input for `create_transaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub deal_id: DealId,
    pub amount: Money,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub from_account: Option<AccountId>,
    #[serde(default)]
    pub to_account: Option<AccountId>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Result of `complete_transaction`.
///
/// A posting rule that no longer holds (insufficient funds, frozen or closed
/// account, deal policy) fails the transaction instead of erroring; the
/// failure is committed and reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed(Transaction),
    AlreadyCompleted(Transaction),
    Failed {
        transaction: Transaction,
        reason: EngineError,
    },
}

impl CompletionOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            CompletionOutcome::Completed(tx) | CompletionOutcome::AlreadyCompleted(tx) => tx,
            CompletionOutcome::Failed { transaction, .. } => transaction,
        }
    }

    pub fn into_transaction(self) -> Transaction {
        match self {
            CompletionOutcome::Completed(tx) | CompletionOutcome::AlreadyCompleted(tx) => tx,
            CompletionOutcome::Failed { transaction, .. } => transaction,
        }
    }
}

/// Apply `postings` to `accounts` (which must contain every posted account).
fn post_all(
    accounts: &mut [TrustAccount],
    postings: &[Posting],
    at: DateTime<Utc>,
) -> EngineResult<()> {
    for posting in postings {
        let account = accounts
            .iter_mut()
            .find(|a| a.id_typed() == posting.account_id)
            .ok_or_else(|| {
                EngineError::invariant(format!("account {} not locked", posting.account_id))
            })?;
        account.post(posting, at)?;
    }
    Ok(())
}

impl<S: EngineStore> Engine<S> {
    /// Record a `pending` transaction against a deal. Balances are untouched.
    #[instrument(
        skip_all,
        fields(actor = %actor, deal_id = %input.deal_id, kind = %input.transaction_type)
    )]
    pub fn create_transaction(
        &self,
        actor: &UserId,
        input: NewTransaction,
    ) -> EngineResult<Transaction> {
        let mut allocated: Option<TransactionId> = None;

        self.run("create_transaction", || {
            let _lock = self.deal_locks.acquire(&input.deal_id)?;
            let deal = self.require_deal(&input.deal_id)?;
            ensure_deal_accepts(deal.status(), input.transaction_type)?;
            for account_id in input.from_account.into_iter().chain(input.to_account) {
                self.require_account(account_id)?;
            }

            let transaction_id =
                *allocated.get_or_insert_with(|| self.store.next_transaction_id());
            let current = Transaction::empty(transaction_id, input.deal_id.clone());
            let command = TransactionCommand::CreateTransaction(CreateTransaction {
                transaction_id,
                deal_id: input.deal_id.clone(),
                amount: input.amount,
                transaction_type: input.transaction_type,
                from_account: input.from_account,
                to_account: input.to_account,
                description: input.description.clone(),
                occurred_at: Utc::now(),
            });
            let (created, steps) = execute(&current, &command)?;

            let mut unit = UnitOfWork::new();
            unit.put_transaction(created.clone(), current.version());
            for step in &steps {
                unit.record(audit::transaction_record(actor, step, &[], &[]));
            }
            self.store.commit(unit)?;

            tracing::debug!(transaction_id = %transaction_id, amount = %created.amount(), "transaction created");
            Ok(created)
        })
    }

    /// Complete a pending transaction: post its balance deltas and mark it
    /// `completed` in one unit of work.
    ///
    /// Idempotent: completing an already completed transaction changes nothing.
    #[instrument(skip_all, fields(actor = %actor, transaction_id = %transaction_id))]
    pub fn complete_transaction(
        &self,
        actor: &UserId,
        transaction_id: TransactionId,
    ) -> EngineResult<CompletionOutcome> {
        self.run("complete_transaction", || {
            let deal_id = self.require_transaction(transaction_id)?.deal_id().clone();
            let _deal_lock = self.deal_locks.acquire(&deal_id)?;

            // Reload under the deal lock; a concurrent completion may have won.
            let current = self.require_transaction(transaction_id)?;
            let now = Utc::now();
            let command = TransactionCommand::CompleteTransaction(CompleteTransaction {
                transaction_id,
                occurred_at: now,
            });
            let (completed, steps) = execute(&current, &command)?;
            let Some(step) = steps.first() else {
                return Ok(CompletionOutcome::AlreadyCompleted(completed));
            };

            let deal = self.require_deal(&deal_id)?;
            let postings = step.event.postings();
            let account_ids = lock_order(postings);
            let _account_locks = self.account_locks.acquire_ordered(&account_ids)?;
            let accounts = account_ids
                .iter()
                .map(|id| self.require_account(*id))
                .collect::<EngineResult<Vec<_>>>()?;

            let mut posted = accounts.clone();
            let checked = ensure_deal_accepts(deal.status(), current.transaction_type())
                .and_then(|()| post_all(&mut posted, postings, now));

            match checked {
                Ok(()) => {}
                Err(reason) if reason.is_posting_rejection() => {
                    let failed = self.fail_transaction(actor, &current, &reason, now)?;
                    return Ok(CompletionOutcome::Failed {
                        transaction: failed,
                        reason,
                    });
                }
                Err(err) => return Err(err),
            }

            let mut unit = UnitOfWork::new();
            unit.put_transaction(completed.clone(), current.version());
            for (before, after) in accounts.iter().zip(&posted) {
                unit.put_account(after.clone(), before.version());
            }
            unit.record(audit::transaction_record(actor, step, &accounts, &posted));
            self.store.commit(unit)?;

            tracing::debug!(
                transaction_id = %transaction_id,
                accounts = posted.len(),
                "transaction completed"
            );
            Ok(CompletionOutcome::Completed(completed))
        })
    }

    fn fail_transaction(
        &self,
        actor: &UserId,
        current: &Transaction,
        reason: &EngineError,
        at: DateTime<Utc>,
    ) -> EngineResult<Transaction> {
        let command = TransactionCommand::FailTransaction(FailTransaction {
            transaction_id: current.id_typed(),
            reason: reason.to_string(),
            occurred_at: at,
        });
        let (failed, steps) = execute(current, &command)?;

        let mut unit = UnitOfWork::new();
        unit.put_transaction(failed.clone(), current.version());
        for step in &steps {
            unit.record(audit::transaction_record(actor, step, &[], &[]));
        }
        self.store.commit(unit)?;

        tracing::info!(
            transaction_id = %current.id(),
            kind = reason.kind(),
            reason = %reason,
            "transaction failed at completion"
        );
        Ok(failed)
    }

    /// Reverse a completed transaction, posting the inverse deltas.
    ///
    /// The inverse postings obey the usual posting rules; if one is rejected
    /// the reversal fails and nothing changes.
    #[instrument(skip_all, fields(actor = %actor, transaction_id = %transaction_id))]
    pub fn reverse_transaction(
        &self,
        actor: &UserId,
        transaction_id: TransactionId,
        note: Option<String>,
    ) -> EngineResult<Transaction> {
        self.run("reverse_transaction", || {
            let deal_id = self.require_transaction(transaction_id)?.deal_id().clone();
            let _deal_lock = self.deal_locks.acquire(&deal_id)?;

            let current = self.require_transaction(transaction_id)?;
            let now = Utc::now();
            let command = TransactionCommand::ReverseTransaction(ReverseTransaction {
                transaction_id,
                note: note.clone(),
                occurred_at: now,
            });
            let (reversed, steps) = execute(&current, &command)?;
            let Some(step) = steps.first() else {
                return Ok(reversed);
            };

            let postings = step.event.postings();
            let account_ids = lock_order(postings);
            let _account_locks = self.account_locks.acquire_ordered(&account_ids)?;
            let accounts = account_ids
                .iter()
                .map(|id| self.require_account(*id))
                .collect::<EngineResult<Vec<_>>>()?;

            let mut posted = accounts.clone();
            post_all(&mut posted, postings, now)?;

            let mut unit = UnitOfWork::new();
            unit.put_transaction(reversed.clone(), current.version());
            for (before, after) in accounts.iter().zip(&posted) {
                unit.put_account(after.clone(), before.version());
            }
            unit.record(audit::transaction_record(actor, step, &accounts, &posted));
            self.store.commit(unit)?;

            tracing::debug!(transaction_id = %transaction_id, "transaction reversed");
            Ok(reversed)
        })
    }

    pub fn get_transaction(&self, transaction_id: TransactionId) -> EngineResult<Transaction> {
        self.require_transaction(transaction_id)
    }

    /// Newest first.
    pub fn list_transactions(&self, filter: &TransactionFilter) -> EngineResult<Vec<Transaction>> {
        self.store.list_transactions(filter)
    }
}
