use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use closingdesk_core::{AccountId, AggregateRoot, EngineResult, UserId};
use closingdesk_ledger::{
    reconcile, AccountCommand, AccountStatus, OpenAccount, Reconciliation, TrustAccount,
    UpdateAccount,
};

use super::{audit, execute, Engine};
use crate::store::{EngineStore, TransactionFilter, UnitOfWork};

/// Input for `open_account`. Accounts always open `active` at a zero balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub account_number: String,
    pub holder_name: String,
}

/// Input for `update_account`; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountChanges {
    #[serde(default)]
    pub holder_name: Option<String>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

impl<S: EngineStore> Engine<S> {
    #[instrument(skip_all, fields(actor = %actor, account_number = %input.account_number))]
    pub fn open_account(&self, actor: &UserId, input: NewAccount) -> EngineResult<TrustAccount> {
        let account_id = self.store.next_account_id();
        let command = AccountCommand::OpenAccount(OpenAccount {
            account_id,
            account_number: input.account_number,
            holder_name: input.holder_name,
            occurred_at: Utc::now(),
        });

        self.run("open_account", || {
            self.commit_account(actor, &TrustAccount::empty(account_id), &command)
        })
    }

    /// Rename, freeze, reactivate or close an account.
    #[instrument(skip_all, fields(actor = %actor, account_id = %account_id))]
    pub fn update_account(
        &self,
        actor: &UserId,
        account_id: AccountId,
        changes: AccountChanges,
    ) -> EngineResult<TrustAccount> {
        self.run("update_account", || {
            let _lock = self.account_locks.acquire(&account_id)?;
            let current = self.require_account(account_id)?;
            let command = AccountCommand::UpdateAccount(UpdateAccount {
                account_id,
                holder_name: changes.holder_name.clone(),
                status: changes.status,
                occurred_at: Utc::now(),
            });
            self.commit_account(actor, &current, &command)
        })
    }

    pub fn get_account(&self, account_id: AccountId) -> EngineResult<TrustAccount> {
        self.require_account(account_id)
    }

    /// Ascending by id.
    pub fn list_accounts(&self) -> EngineResult<Vec<TrustAccount>> {
        self.store.list_accounts()
    }

    /// Compare the stored balance with the one derived from completed
    /// transactions. A mismatch is an `InvariantViolation`; it is logged,
    /// never repaired.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub fn reconcile_account(&self, account_id: AccountId) -> EngineResult<Reconciliation> {
        let _lock = self.account_locks.acquire(&account_id)?;
        let account = self.require_account(account_id)?;
        let transactions = self
            .store
            .list_transactions(&TransactionFilter::for_account(account_id))?;

        let report = reconcile(&account, &transactions)?;
        if let Err(err) = report.ensure_balanced() {
            tracing::error!(
                account = %audit::account_summary(&account),
                transactions = transactions.len(),
                error = %err,
                "trust account out of balance"
            );
            return Err(err);
        }
        Ok(report)
    }

    fn commit_account(
        &self,
        actor: &UserId,
        current: &TrustAccount,
        command: &AccountCommand,
    ) -> EngineResult<TrustAccount> {
        let (next, steps) = execute(current, command)?;
        if steps.is_empty() {
            return Ok(next);
        }

        let mut unit = UnitOfWork::new();
        unit.put_account(next.clone(), current.version());
        for step in &steps {
            unit.record(audit::account_record(actor, step));
        }
        self.store.commit(unit)?;

        tracing::debug!(
            account_id = %next.id(),
            status = %next.status(),
            version = next.version(),
            "trust account committed"
        );
        Ok(next)
    }
}
