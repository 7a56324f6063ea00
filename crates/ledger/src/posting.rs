//! Balance postings derived from a transaction.

use serde::{Deserialize, Serialize};

use closingdesk_core::{AccountId, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

/// A single balance movement on one trust account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub account_id: AccountId,
    pub direction: Direction,
    /// Always positive.
    pub amount: Money,
}

impl Posting {
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            direction: Direction::Debit,
            amount,
        }
    }

    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            direction: Direction::Credit,
            amount,
        }
    }

    /// The posting that undoes this one.
    pub fn inverse(&self) -> Self {
        let direction = match self.direction {
            Direction::Debit => Direction::Credit,
            Direction::Credit => Direction::Debit,
        };
        Self {
            direction,
            ..*self
        }
    }

    /// Signed effect on the balance.
    pub fn delta(&self) -> Money {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => Money::from_minor(-self.amount.minor()),
        }
    }
}

/// Postings for a movement `from → to` (debit source, credit destination).
pub fn postings_for(
    from_account: Option<AccountId>,
    to_account: Option<AccountId>,
    amount: Money,
) -> Vec<Posting> {
    let mut postings = Vec::with_capacity(2);
    if let Some(from) = from_account {
        postings.push(Posting::debit(from, amount));
    }
    if let Some(to) = to_account {
        postings.push(Posting::credit(to, amount));
    }
    postings
}

pub fn invert(postings: &[Posting]) -> Vec<Posting> {
    postings.iter().map(Posting::inverse).collect()
}

/// Distinct accounts touched by `postings`, ascending (the lock order).
pub fn lock_order(postings: &[Posting]) -> Vec<AccountId> {
    let mut ids: Vec<AccountId> = postings.iter().map(|p| p.account_id).collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_debits_source_and_credits_destination() {
        let postings = postings_for(
            Some(AccountId::new(2)),
            Some(AccountId::new(1)),
            Money::from_minor(500),
        );

        assert_eq!(
            postings,
            vec![
                Posting::debit(AccountId::new(2), Money::from_minor(500)),
                Posting::credit(AccountId::new(1), Money::from_minor(500)),
            ]
        );
        let net: i64 = postings.iter().map(|p| p.delta().minor()).sum();
        assert_eq!(net, 0);
    }

    #[test]
    fn inverse_flips_every_delta() {
        let postings = postings_for(Some(AccountId::new(1)), None, Money::from_minor(75));
        let inverse = invert(&postings);
        assert_eq!(inverse[0].delta(), Money::from_minor(75));
    }

    #[test]
    fn lock_order_is_ascending_and_distinct() {
        let postings = postings_for(
            Some(AccountId::new(9)),
            Some(AccountId::new(3)),
            Money::from_minor(1),
        );
        assert_eq!(lock_order(&postings), vec![AccountId::new(3), AccountId::new(9)]);
    }
}
