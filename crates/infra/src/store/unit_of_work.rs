use serde::{Deserialize, Serialize};

use closingdesk_audit::{AuditRecord, UncommittedAuditRecord};
use closingdesk_core::{AggregateRoot, DealId, ExpectedVersion};
use closingdesk_deals::Deal;
use closingdesk_ledger::{Transaction, TrustAccount};

/// Post-image (or deletion) of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Write {
    PutDeal(Deal),
    DeleteDeal(DealId),
    PutAccount(TrustAccount),
    PutTransaction(Transaction),
}

/// A write plus the version the entity must be at when it is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    pub expected: ExpectedVersion,
    pub write: Write,
}

/// Everything one engine operation changes, committed atomically.
///
/// Entity writes and audit records become visible together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOfWork {
    staged: Vec<Staged>,
    audit: Vec<UncommittedAuditRecord>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a deal post-image; `loaded_version` is the version it was read at.
    pub fn put_deal(&mut self, deal: Deal, loaded_version: u64) -> &mut Self {
        self.stage(ExpectedVersion::Exact(loaded_version), Write::PutDeal(deal))
    }

    pub fn delete_deal(&mut self, deal: &Deal) -> &mut Self {
        self.stage(
            ExpectedVersion::Exact(deal.version()),
            Write::DeleteDeal(deal.id().clone()),
        )
    }

    pub fn put_account(&mut self, account: TrustAccount, loaded_version: u64) -> &mut Self {
        self.stage(ExpectedVersion::Exact(loaded_version), Write::PutAccount(account))
    }

    pub fn put_transaction(&mut self, transaction: Transaction, loaded_version: u64) -> &mut Self {
        self.stage(
            ExpectedVersion::Exact(loaded_version),
            Write::PutTransaction(transaction),
        )
    }

    pub fn stage(&mut self, expected: ExpectedVersion, write: Write) -> &mut Self {
        self.staged.push(Staged { expected, write });
        self
    }

    pub fn record(&mut self, record: UncommittedAuditRecord) -> &mut Self {
        self.audit.push(record);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.audit.is_empty()
    }

    pub fn staged(&self) -> &[Staged] {
        &self.staged
    }

    pub fn audit(&self) -> &[UncommittedAuditRecord] {
        &self.audit
    }

    pub fn into_parts(self) -> (Vec<Staged>, Vec<UncommittedAuditRecord>) {
        (self.staged, self.audit)
    }
}

/// One committed unit of work as written to the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub writes: Vec<Write>,
    pub audit: Vec<AuditRecord>,
}
