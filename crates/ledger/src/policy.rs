//! Deal-dependent funding policy and balance reconciliation.

use serde::{Deserialize, Serialize};

use closingdesk_core::{AccountId, EngineError, EngineResult, Money};
use closingdesk_deals::DealStatus;

use crate::account::TrustAccount;
use crate::posting::Direction;
use crate::transaction::{Transaction, TransactionStatus, TransactionType};

/// Once a deal is terminal, only refunds and adjustments may move money for it.
pub fn ensure_deal_accepts(deal_status: DealStatus, kind: TransactionType) -> EngineResult<()> {
    if deal_status.is_terminal()
        && !matches!(kind, TransactionType::Refund | TransactionType::Adjustment)
    {
        return Err(EngineError::not_permitted(
            format!("{kind} transaction"),
            format!("deal is {deal_status}"),
        ));
    }
    Ok(())
}

/// Sum of completed deposit/payment transactions.
pub fn funded_amount<'a, I>(transactions: I) -> EngineResult<Money>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    Money::checked_sum(
        transactions
            .into_iter()
            .filter(|t| t.status() == TransactionStatus::Completed)
            .filter(|t| t.transaction_type().is_funding())
            .map(Transaction::amount),
    )
    .ok_or_else(|| EngineError::invariant("funded amount overflow"))
}

/// Balance implied by the account's completed transactions.
pub fn derived_balance<'a, I>(account_id: AccountId, transactions: I) -> EngineResult<Money>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut balance = Money::ZERO;
    for tx in transactions
        .into_iter()
        .filter(|t| t.status() == TransactionStatus::Completed)
    {
        for posting in tx.postings().iter().filter(|p| p.account_id == account_id) {
            let delta = match posting.direction {
                Direction::Credit => Some(posting.amount),
                Direction::Debit => posting.amount.checked_neg(),
            };
            balance = delta
                .and_then(|d| balance.checked_add(d))
                .ok_or_else(|| EngineError::invariant("derived balance overflow"))?;
        }
    }
    Ok(balance)
}

/// Stored vs derived balance for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub account_id: AccountId,
    pub stored_balance: Money,
    pub derived_balance: Money,
    pub balanced: bool,
}

impl Reconciliation {
    pub fn ensure_balanced(&self) -> EngineResult<()> {
        if self.balanced {
            return Ok(());
        }
        Err(EngineError::invariant(format!(
            "account {} stored balance {} differs from derived balance {}",
            self.account_id, self.stored_balance, self.derived_balance
        )))
    }
}

pub fn reconcile<'a, I>(account: &TrustAccount, transactions: I) -> EngineResult<Reconciliation>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let account_id = account.id_typed();
    let derived = derived_balance(account_id, transactions)?;
    Ok(Reconciliation {
        account_id,
        stored_balance: account.balance(),
        derived_balance: derived,
        balanced: derived == account.balance(),
    })
}
