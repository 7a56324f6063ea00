//! Trust ledger: trust accounts, transactions and the posting rules that
//! keep every balance equal to its completed transactions.

pub mod account;
pub mod policy;
pub mod posting;
pub mod transaction;

pub use account::{
    AccountCommand, AccountEvent, AccountStatus, OpenAccount, TrustAccount, UpdateAccount,
};
pub use policy::{derived_balance, ensure_deal_accepts, funded_amount, reconcile, Reconciliation};
pub use posting::{lock_order, Direction, Posting};
pub use transaction::{
    CompleteTransaction, CreateTransaction, FailTransaction, ReverseTransaction, Transaction,
    TransactionCommand, TransactionEvent, TransactionStatus, TransactionType,
};
