use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use closingdesk_core::{
    AccountId, Aggregate, AggregateRoot, DomainEvent, EngineError, EngineResult, Money,
};

use crate::posting::{Direction, Posting};

pub const ACCOUNT_NUMBER_LEN: core::ops::RangeInclusive<usize> = 5..=50;
pub const HOLDER_NAME_LEN: core::ops::RangeInclusive<usize> = 1..=100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Frozen,
    Closed,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Frozen => "frozen",
            AccountStatus::Closed => "closed",
        }
    }

    /// `active ↔ frozen`, and either to `closed` (terminal).
    pub fn permits(self, to: AccountStatus) -> bool {
        use AccountStatus::*;
        matches!(
            (self, to),
            (Active, Frozen) | (Frozen, Active) | (Active, Closed) | (Frozen, Closed)
        )
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root: TrustAccount.
///
/// `balance` is derived state. It only moves through [`TrustAccount::post`],
/// which the transaction processor drives on completion and reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustAccount {
    id: AccountId,
    account_number: String,
    holder_name: String,
    balance: Money,
    status: AccountStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl TrustAccount {
    pub fn empty(id: AccountId) -> Self {
        Self {
            id,
            account_number: String::new(),
            holder_name: String::new(),
            balance: Money::ZERO,
            status: AccountStatus::Active,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> AccountId {
        self.id
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn status(&self) -> AccountStatus {
        self.status
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

    /// Check a posting against status and balance rules without applying it.
    pub fn check_posting(&self, posting: &Posting) -> EngineResult<()> {
        if posting.account_id != self.id {
            return Err(EngineError::invariant(format!(
                "posting for account {} applied to account {}",
                posting.account_id, self.id
            )));
        }
        if !posting.amount.is_positive() {
            return Err(EngineError::invariant("posting amount must be positive"));
        }

        match (self.status, posting.direction) {
            (AccountStatus::Closed, _) => Err(EngineError::AccountClosed(self.id)),
            (AccountStatus::Frozen, Direction::Debit) => Err(EngineError::AccountFrozen(self.id)),
            (_, Direction::Debit) => {
                let remaining = self
                    .balance
                    .checked_sub(posting.amount)
                    .ok_or_else(|| EngineError::invariant("balance underflow"))?;
                if remaining.is_negative() {
                    return Err(EngineError::InsufficientFunds {
                        account_id: self.id,
                        balance: self.balance,
                        requested: posting.amount,
                    });
                }
                Ok(())
            }
            (_, Direction::Credit) => {
                self.balance
                    .checked_add(posting.amount)
                    .ok_or_else(|| EngineError::invariant("balance overflow"))?;
                Ok(())
            }
        }
    }

    /// Apply a posting after [`TrustAccount::check_posting`] accepts it.
    pub fn post(&mut self, posting: &Posting, at: DateTime<Utc>) -> EngineResult<()> {
        self.check_posting(posting)?;
        self.balance = self
            .balance
            .checked_add(posting.delta())
            .ok_or_else(|| EngineError::invariant("balance overflow"))?;
        self.updated_at = at;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for TrustAccount {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenAccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccount {
    pub account_id: AccountId,
    pub account_number: String,
    pub holder_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateAccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAccount {
    pub account_id: AccountId,
    pub holder_name: Option<String>,
    pub status: Option<AccountStatus>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCommand {
    OpenAccount(OpenAccount),
    UpdateAccount(UpdateAccount),
}

/// Event: AccountOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOpened {
    pub account_id: AccountId,
    pub account_number: String,
    pub holder_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AccountUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdated {
    pub account_id: AccountId,
    pub holder_name: Option<String>,
    pub status: Option<AccountStatus>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    AccountOpened(AccountOpened),
    AccountUpdated(AccountUpdated),
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountOpened(_) => "trust_account.opened",
            AccountEvent::AccountUpdated(e) => match e.status {
                Some(AccountStatus::Frozen) => "trust_account.frozen",
                Some(AccountStatus::Closed) => "trust_account.closed",
                Some(AccountStatus::Active) => "trust_account.reactivated",
                None => "trust_account.updated",
            },
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::AccountOpened(e) => e.occurred_at,
            AccountEvent::AccountUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for TrustAccount {
    type Command = AccountCommand;
    type Event = AccountEvent;
    type Error = EngineError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AccountEvent::AccountOpened(e) => {
                self.id = e.account_id;
                self.account_number = e.account_number.clone();
                self.holder_name = e.holder_name.clone();
                self.balance = Money::ZERO;
                self.status = AccountStatus::Active;
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
            }
            AccountEvent::AccountUpdated(e) => {
                if let Some(name) = &e.holder_name {
                    self.holder_name = name.clone();
                }
                if let Some(status) = e.status {
                    self.status = status;
                }
                self.updated_at = e.occurred_at;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AccountCommand::OpenAccount(cmd) => self.handle_open(cmd),
            AccountCommand::UpdateAccount(cmd) => self.handle_update(cmd),
        }
    }
}

fn validate_len(
    field: &str,
    value: &str,
    range: &core::ops::RangeInclusive<usize>,
) -> EngineResult<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if !range.contains(&len) {
        return Err(EngineError::validation(
            field,
            format!(
                "must be between {} and {} characters",
                range.start(),
                range.end()
            ),
        ));
    }
    Ok(trimmed.to_string())
}

impl TrustAccount {
    fn ensure_created(&self) -> EngineResult<()> {
        if !self.is_created() {
            return Err(EngineError::not_found("trust_account", self.id));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenAccount) -> EngineResult<Vec<AccountEvent>> {
        if self.is_created() {
            return Err(EngineError::validation("account_id", "account already exists"));
        }

        let account_number =
            validate_len("account_number", &cmd.account_number, &ACCOUNT_NUMBER_LEN)?;
        let holder_name = validate_len("holder_name", &cmd.holder_name, &HOLDER_NAME_LEN)?;

        Ok(vec![AccountEvent::AccountOpened(AccountOpened {
            account_id: cmd.account_id,
            account_number,
            holder_name,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateAccount) -> EngineResult<Vec<AccountEvent>> {
        self.ensure_created()?;
        if cmd.account_id != self.id {
            return Err(EngineError::invariant("account_id mismatch"));
        }

        let holder_name = match &cmd.holder_name {
            Some(name) => {
                let name = validate_len("holder_name", name, &HOLDER_NAME_LEN)?;
                (name != self.holder_name).then_some(name)
            }
            None => None,
        };

        let status = match cmd.status {
            Some(to) if to == self.status => None,
            Some(to) if self.status.permits(to) => Some(to),
            Some(to) => {
                return Err(EngineError::invalid_transition(
                    "trust_account",
                    self.status,
                    to,
                ));
            }
            None => None,
        };

        if holder_name.is_some() && self.status == AccountStatus::Closed {
            return Err(EngineError::not_permitted("rename", self.status));
        }

        if holder_name.is_none() && status.is_none() {
            return Ok(vec![]);
        }

        Ok(vec![AccountEvent::AccountUpdated(AccountUpdated {
            account_id: cmd.account_id,
            holder_name,
            status,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn open(id: i64) -> TrustAccount {
        let mut account = TrustAccount::empty(AccountId::new(id));
        let events = account
            .handle(&AccountCommand::OpenAccount(OpenAccount {
                account_id: AccountId::new(id),
                account_number: format!("TR-{id:05}"),
                holder_name: "Harbour Law LLP".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            account.apply(e);
        }
        account
    }

    fn set_status(account: &mut TrustAccount, status: AccountStatus) -> EngineResult<()> {
        let events = account.handle(&AccountCommand::UpdateAccount(UpdateAccount {
            account_id: account.id_typed(),
            holder_name: None,
            status: Some(status),
            occurred_at: test_time(),
        }))?;
        for e in &events {
            account.apply(e);
        }
        Ok(())
    }

    fn credit(account: &mut TrustAccount, minor: i64) {
        let posting = Posting::credit(account.id_typed(), Money::from_minor(minor));
        account.post(&posting, test_time()).unwrap();
    }

    #[test]
    fn opens_active_with_zero_balance() {
        let account = open(1);
        assert_eq!(account.status(), AccountStatus::Active);
        assert_eq!(account.balance(), Money::ZERO);
        assert_eq!(account.version(), 1);
    }

    #[test]
    fn account_number_and_holder_name_lengths_are_validated() {
        let account = TrustAccount::empty(AccountId::new(1));
        let err = account
            .handle(&AccountCommand::OpenAccount(OpenAccount {
                account_id: AccountId::new(1),
                account_number: "1234".to_string(),
                holder_name: "Holder".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            EngineError::Validation { field, .. } => assert_eq!(field, "account_number"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = account
            .handle(&AccountCommand::OpenAccount(OpenAccount {
                account_id: AccountId::new(1),
                account_number: "TR-00001".to_string(),
                holder_name: "   ".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            EngineError::Validation { field, .. } => assert_eq!(field, "holder_name"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn debit_beyond_balance_is_insufficient_funds() {
        let mut account = open(1);
        credit(&mut account, 1_000);

        let err = account
            .post(&Posting::debit(AccountId::new(1), Money::from_minor(1_001)), test_time())
            .unwrap_err();

        assert_eq!(
            err,
            EngineError::InsufficientFunds {
                account_id: AccountId::new(1),
                balance: Money::from_minor(1_000),
                requested: Money::from_minor(1_001),
            }
        );
        assert_eq!(account.balance(), Money::from_minor(1_000));
    }

    #[test]
    fn frozen_accounts_accept_credits_but_not_debits() {
        let mut account = open(1);
        credit(&mut account, 500);
        set_status(&mut account, AccountStatus::Frozen).unwrap();

        credit(&mut account, 250);
        let err = account
            .post(&Posting::debit(AccountId::new(1), Money::from_minor(100)), test_time())
            .unwrap_err();

        assert_eq!(err, EngineError::AccountFrozen(AccountId::new(1)));
        assert_eq!(account.balance(), Money::from_minor(750));
    }

    #[test]
    fn closed_accounts_reject_everything_and_stay_closed() {
        let mut account = open(1);
        credit(&mut account, 500);
        set_status(&mut account, AccountStatus::Closed).unwrap();

        let err = account
            .post(&Posting::credit(AccountId::new(1), Money::from_minor(1)), test_time())
            .unwrap_err();
        assert_eq!(err, EngineError::AccountClosed(AccountId::new(1)));
        assert_eq!(account.balance(), Money::from_minor(500));

        let err = set_status(&mut account, AccountStatus::Active).unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");
    }

    #[test]
    fn unchanged_update_emits_nothing() {
        let account = open(1);
        let events = account
            .handle(&AccountCommand::UpdateAccount(UpdateAccount {
                account_id: AccountId::new(1),
                holder_name: Some("Harbour Law LLP".to_string()),
                status: Some(AccountStatus::Active),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert!(events.is_empty());
    }
}
