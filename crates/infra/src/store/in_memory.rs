use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use closingdesk_audit::{AuditLog, AuditPage, AuditQuery, AuditRecord};
use closingdesk_core::{
    AccountId, AggregateRoot, DealId, EngineError, EngineResult, TransactionId,
};
use closingdesk_deals::Deal;
use closingdesk_ledger::{Transaction, TrustAccount};

use super::journal::Journal;
use super::r#trait::{DealFilter, EngineStore, TransactionFilter};
use super::unit_of_work::{JournalEntry, Staged, UnitOfWork, Write};

#[derive(Debug, Default)]
struct State {
    deals: HashMap<DealId, Deal>,
    accounts: BTreeMap<AccountId, TrustAccount>,
    transactions: BTreeMap<TransactionId, Transaction>,
    audit: AuditLog,
    journal: Option<Journal>,
}

impl State {
    fn current_version(&self, write: &Write) -> u64 {
        match write {
            Write::PutDeal(deal) => self.deals.get(deal.id()).map_or(0, Deal::version),
            Write::DeleteDeal(id) => self.deals.get(id).map_or(0, Deal::version),
            Write::PutAccount(acc) => self
                .accounts
                .get(acc.id())
                .map_or(0, TrustAccount::version),
            Write::PutTransaction(tx) => self
                .transactions
                .get(tx.id())
                .map_or(0, Transaction::version),
        }
    }

    fn check_staged(&self, staged: &[Staged]) -> EngineResult<()> {
        for item in staged {
            item.expected.check(self.current_version(&item.write))?;

            if let Write::PutAccount(acc) = &item.write {
                let taken = self.accounts.values().any(|existing| {
                    existing.id() != acc.id() && existing.account_number() == acc.account_number()
                });
                if taken {
                    return Err(EngineError::validation(
                        "account_number",
                        format!("account number {} is already in use", acc.account_number()),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Apply a committed entry; shared by `commit` and journal replay.
    fn apply(&mut self, entry: &JournalEntry) -> EngineResult<()> {
        self.audit.check_continues(&entry.audit)?;
        for write in &entry.writes {
            match write {
                Write::PutDeal(deal) => {
                    self.deals.insert(deal.id().clone(), deal.clone());
                }
                Write::DeleteDeal(id) => {
                    self.deals.remove(id);
                }
                Write::PutAccount(acc) => {
                    self.accounts.insert(acc.id_typed(), acc.clone());
                }
                Write::PutTransaction(tx) => {
                    self.transactions.insert(tx.id_typed(), tx.clone());
                }
            }
        }
        self.audit.extend(&entry.audit)
    }
}

/// In-memory engine store, optionally backed by a journal file.
///
/// A single `RwLock` guards all entities and the audit log, so a commit is
/// atomic with respect to every reader.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<State>,
    last_account_id: AtomicI64,
    last_transaction_id: AtomicI64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Volatile store; nothing survives the process.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            last_account_id: AtomicI64::new(0),
            last_transaction_id: AtomicI64::new(0),
        }
    }

    /// Store backed by a journal at `path`, replaying whatever it already holds.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let (journal, entries) = Journal::open(path)?;

        let mut state = State::default();
        for entry in &entries {
            state.apply(entry)?;
        }

        let last_account = state.accounts.keys().next_back().map_or(0, |id| id.get());
        let last_transaction = state
            .transactions
            .keys()
            .next_back()
            .map_or(0, |id| id.get());

        tracing::info!(
            path = %journal.path().display(),
            entries = entries.len(),
            deals = state.deals.len(),
            accounts = state.accounts.len(),
            transactions = state.transactions.len(),
            "journal replayed"
        );

        state.journal = Some(journal);
        Ok(Self {
            state: RwLock::new(state),
            last_account_id: AtomicI64::new(last_account),
            last_transaction_id: AtomicI64::new(last_transaction),
        })
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| EngineError::storage("lock poisoned"))
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| EngineError::storage("lock poisoned"))
    }
}

impl EngineStore for InMemoryStore {
    fn load_deal(&self, id: &DealId) -> EngineResult<Option<Deal>> {
        Ok(self.read()?.deals.get(id).cloned())
    }

    fn list_deals(&self, filter: &DealFilter) -> EngineResult<Vec<Deal>> {
        let state = self.read()?;
        let mut deals: Vec<Deal> = state
            .deals
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        deals.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(deals)
    }

    fn load_account(&self, id: AccountId) -> EngineResult<Option<TrustAccount>> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    fn list_accounts(&self) -> EngineResult<Vec<TrustAccount>> {
        Ok(self.read()?.accounts.values().cloned().collect())
    }

    fn load_transaction(&self, id: TransactionId) -> EngineResult<Option<Transaction>> {
        Ok(self.read()?.transactions.get(&id).cloned())
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> EngineResult<Vec<Transaction>> {
        Ok(self
            .read()?
            .transactions
            .values()
            .rev()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    fn query_audit(&self, query: &AuditQuery) -> EngineResult<AuditPage> {
        Ok(self.read()?.audit.query(query))
    }

    fn next_account_id(&self) -> AccountId {
        AccountId::new(self.last_account_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn next_transaction_id(&self) -> TransactionId {
        TransactionId::new(self.last_transaction_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn commit(&self, unit: UnitOfWork) -> EngineResult<Vec<AuditRecord>> {
        if unit.is_empty() {
            return Ok(vec![]);
        }

        let mut state = self.write()?;
        state.check_staged(unit.staged())?;

        let (staged, pending) = unit.into_parts();
        let entry = JournalEntry {
            writes: staged.into_iter().map(|s| s.write).collect(),
            audit: state.audit.sequence(pending),
        };

        // Durable first; in-memory state only moves once the entry is on disk.
        if let Some(journal) = state.journal.as_mut() {
            journal.append(&entry)?;
        }
        state.apply(&entry)?;

        tracing::debug!(
            writes = entry.writes.len(),
            audit_records = entry.audit.len(),
            "unit of work committed"
        );
        Ok(entry.audit)
    }
}
