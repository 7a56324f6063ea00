use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use closingdesk_core::{
    AccountId, Aggregate, AggregateRoot, DealId, DomainEvent, EngineError, EngineResult, Money,
    TransactionId,
};

use crate::posting::{invert, postings_for, Posting};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Payment,
    Refund,
    Commission,
    Adjustment,
}

impl TransactionType {
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Deposit,
        TransactionType::Payment,
        TransactionType::Refund,
        TransactionType::Commission,
        TransactionType::Adjustment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Payment => "payment",
            TransactionType::Refund => "refund",
            TransactionType::Commission => "commission",
            TransactionType::Adjustment => "adjustment",
        }
    }

    /// Counts toward the deal's funding requirement.
    pub fn is_funding(self) -> bool {
        matches!(self, TransactionType::Deposit | TransactionType::Payment)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EngineError::validation("type", format!("unknown transaction type `{s}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 4] = [
        TransactionStatus::Pending,
        TransactionStatus::Completed,
        TransactionStatus::Failed,
        TransactionStatus::Reversed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Reversed => "reversed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionStatus::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                EngineError::validation("status", format!("unknown transaction status `{s}`"))
            })
    }
}

/// Aggregate root: Transaction.
///
/// Immutable once created except for `status` (and `failure_reason` when it fails).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    deal_id: DealId,
    amount: Money,
    transaction_type: TransactionType,
    status: TransactionStatus,
    from_account: Option<AccountId>,
    to_account: Option<AccountId>,
    description: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Transaction {
    pub fn empty(id: TransactionId, deal_id: DealId) -> Self {
        Self {
            id,
            deal_id,
            amount: Money::ZERO,
            transaction_type: TransactionType::Deposit,
            status: TransactionStatus::Pending,
            from_account: None,
            to_account: None,
            description: None,
            failure_reason: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> TransactionId {
        self.id
    }

    pub fn deal_id(&self) -> &DealId {
        &self.deal_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn from_account(&self) -> Option<AccountId> {
        self.from_account
    }

    pub fn to_account(&self) -> Option<AccountId> {
        self.to_account
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_created(&self) -> bool {
        self.version > 0
    }

    /// Postings applied when this transaction completes.
    pub fn postings(&self) -> Vec<Posting> {
        postings_for(self.from_account, self.to_account, self.amount)
    }

    pub fn touches(&self, account_id: AccountId) -> bool {
        self.from_account == Some(account_id) || self.to_account == Some(account_id)
    }
}

impl AggregateRoot for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateTransaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub transaction_id: TransactionId,
    pub deal_id: DealId,
    pub amount: Money,
    pub transaction_type: TransactionType,
    pub from_account: Option<AccountId>,
    pub to_account: Option<AccountId>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteTransaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteTransaction {
    pub transaction_id: TransactionId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: FailTransaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailTransaction {
    pub transaction_id: TransactionId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReverseTransaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseTransaction {
    pub transaction_id: TransactionId,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionCommand {
    CreateTransaction(CreateTransaction),
    CompleteTransaction(CompleteTransaction),
    FailTransaction(FailTransaction),
    ReverseTransaction(ReverseTransaction),
}

/// Event: TransactionCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCreated {
    pub transaction_id: TransactionId,
    pub deal_id: DealId,
    pub amount: Money,
    pub transaction_type: TransactionType,
    pub from_account: Option<AccountId>,
    pub to_account: Option<AccountId>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionCompleted. Carries the postings to apply to accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCompleted {
    pub transaction_id: TransactionId,
    pub postings: Vec<Posting>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionFailed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFailed {
    pub transaction_id: TransactionId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionReversed. Carries the inverse postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReversed {
    pub transaction_id: TransactionId,
    pub postings: Vec<Posting>,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionEvent {
    TransactionCreated(TransactionCreated),
    TransactionCompleted(TransactionCompleted),
    TransactionFailed(TransactionFailed),
    TransactionReversed(TransactionReversed),
}

impl TransactionEvent {
    /// Balance postings the event carries (empty for create/fail).
    pub fn postings(&self) -> &[Posting] {
        match self {
            TransactionEvent::TransactionCompleted(e) => &e.postings,
            TransactionEvent::TransactionReversed(e) => &e.postings,
            _ => &[],
        }
    }
}

impl DomainEvent for TransactionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransactionEvent::TransactionCreated(_) => "transaction.created",
            TransactionEvent::TransactionCompleted(_) => "transaction.completed",
            TransactionEvent::TransactionFailed(_) => "transaction.failed",
            TransactionEvent::TransactionReversed(_) => "transaction.reversed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TransactionEvent::TransactionCreated(e) => e.occurred_at,
            TransactionEvent::TransactionCompleted(e) => e.occurred_at,
            TransactionEvent::TransactionFailed(e) => e.occurred_at,
            TransactionEvent::TransactionReversed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Transaction {
    type Command = TransactionCommand;
    type Event = TransactionEvent;
    type Error = EngineError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            TransactionEvent::TransactionCreated(e) => {
                self.id = e.transaction_id;
                self.deal_id = e.deal_id.clone();
                self.amount = e.amount;
                self.transaction_type = e.transaction_type;
                self.status = TransactionStatus::Pending;
                self.from_account = e.from_account;
                self.to_account = e.to_account;
                self.description = e.description.clone();
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
            }
            TransactionEvent::TransactionCompleted(e) => {
                self.status = TransactionStatus::Completed;
                self.updated_at = e.occurred_at;
            }
            TransactionEvent::TransactionFailed(e) => {
                self.status = TransactionStatus::Failed;
                self.failure_reason = Some(e.reason.clone());
                self.updated_at = e.occurred_at;
            }
            TransactionEvent::TransactionReversed(e) => {
                self.status = TransactionStatus::Reversed;
                self.updated_at = e.occurred_at;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            TransactionCommand::CreateTransaction(cmd) => self.handle_create(cmd),
            TransactionCommand::CompleteTransaction(cmd) => self.handle_complete(cmd),
            TransactionCommand::FailTransaction(cmd) => self.handle_fail(cmd),
            TransactionCommand::ReverseTransaction(cmd) => self.handle_reverse(cmd),
        }
    }
}

impl Transaction {
    fn ensure_created(&self) -> EngineResult<()> {
        if !self.is_created() {
            return Err(EngineError::not_found("transaction", self.id));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateTransaction) -> EngineResult<Vec<TransactionEvent>> {
        if self.is_created() {
            return Err(EngineError::validation("transaction_id", "transaction already exists"));
        }
        if !cmd.amount.is_positive() {
            return Err(EngineError::validation("amount", "amount must be positive"));
        }
        if let (Some(from), Some(to)) = (cmd.from_account, cmd.to_account) {
            if from == to {
                return Err(EngineError::validation(
                    "to_account",
                    "source and destination accounts must differ",
                ));
            }
        }

        Ok(vec![TransactionEvent::TransactionCreated(TransactionCreated {
            transaction_id: cmd.transaction_id,
            deal_id: cmd.deal_id.clone(),
            amount: cmd.amount,
            transaction_type: cmd.transaction_type,
            from_account: cmd.from_account,
            to_account: cmd.to_account,
            description: cmd.description.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &CompleteTransaction) -> EngineResult<Vec<TransactionEvent>> {
        self.ensure_created()?;

        match self.status {
            TransactionStatus::Completed => Ok(vec![]),
            TransactionStatus::Pending => {
                Ok(vec![TransactionEvent::TransactionCompleted(TransactionCompleted {
                    transaction_id: self.id,
                    postings: self.postings(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            status => Err(EngineError::invalid_transition(
                "transaction",
                status,
                TransactionStatus::Completed,
            )),
        }
    }

    fn handle_fail(&self, cmd: &FailTransaction) -> EngineResult<Vec<TransactionEvent>> {
        self.ensure_created()?;

        if self.status != TransactionStatus::Pending {
            return Err(EngineError::invalid_transition(
                "transaction",
                self.status,
                TransactionStatus::Failed,
            ));
        }

        Ok(vec![TransactionEvent::TransactionFailed(TransactionFailed {
            transaction_id: self.id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reverse(&self, cmd: &ReverseTransaction) -> EngineResult<Vec<TransactionEvent>> {
        self.ensure_created()?;

        match self.status {
            TransactionStatus::Reversed => Ok(vec![]),
            TransactionStatus::Completed => {
                Ok(vec![TransactionEvent::TransactionReversed(TransactionReversed {
                    transaction_id: self.id,
                    postings: invert(&self.postings()),
                    note: cmd.note.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            status => Err(EngineError::invalid_transition(
                "transaction",
                status,
                TransactionStatus::Reversed,
            )),
        }
    }
}
