use closingdesk_audit::{AuditPage, AuditQuery, AuditRecord};
use closingdesk_core::{AccountId, DealId, EngineResult, PropertyId, TransactionId};
use closingdesk_deals::{Deal, DealStatus};
use closingdesk_ledger::{Transaction, TransactionStatus, TransactionType, TrustAccount};

use super::unit_of_work::UnitOfWork;

/// Deal listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFilter {
    pub status: Option<DealStatus>,
    pub property_id: Option<PropertyId>,
}

impl DealFilter {
    pub fn matches(&self, deal: &Deal) -> bool {
        self.status.is_none_or(|s| s == deal.status())
            && self
                .property_id
                .as_ref()
                .is_none_or(|p| p == deal.property_id())
    }
}

/// Transaction listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub deal_id: Option<DealId>,
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    /// Transactions debiting or crediting this account.
    pub account_id: Option<AccountId>,
}

impl TransactionFilter {
    pub fn for_deal(deal_id: DealId) -> Self {
        Self {
            deal_id: Some(deal_id),
            ..Self::default()
        }
    }

    pub fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.deal_id.as_ref().is_none_or(|d| d == tx.deal_id())
            && self
                .transaction_type
                .is_none_or(|t| t == tx.transaction_type())
            && self.status.is_none_or(|s| s == tx.status())
            && self.account_id.is_none_or(|a| tx.touches(a))
    }
}

/// Storage boundary for the engine.
///
/// Reads return owned snapshots. All mutation goes through [`EngineStore::commit`],
/// which applies a whole [`UnitOfWork`] atomically after checking every staged
/// entity's expected version.
pub trait EngineStore: Send + Sync {
    fn load_deal(&self, id: &DealId) -> EngineResult<Option<Deal>>;

    /// Newest first.
    fn list_deals(&self, filter: &DealFilter) -> EngineResult<Vec<Deal>>;

    fn load_account(&self, id: AccountId) -> EngineResult<Option<TrustAccount>>;

    /// Ascending by id.
    fn list_accounts(&self) -> EngineResult<Vec<TrustAccount>>;

    fn load_transaction(&self, id: TransactionId) -> EngineResult<Option<Transaction>>;

    /// Newest first.
    fn list_transactions(&self, filter: &TransactionFilter) -> EngineResult<Vec<Transaction>>;

    fn query_audit(&self, query: &AuditQuery) -> EngineResult<AuditPage>;

    /// Allocate a fresh trust account id (ledger id space).
    fn next_account_id(&self) -> AccountId;

    /// Allocate a fresh transaction id (ledger id space).
    fn next_transaction_id(&self) -> TransactionId;

    /// Commit a unit of work; returns the sequenced audit records.
    ///
    /// Fails with `Contention` if any staged entity moved past its expected
    /// version, leaving the store untouched.
    fn commit(&self, unit: UnitOfWork) -> EngineResult<Vec<AuditRecord>>;
}
