//! Audit record construction and the audit query entry point.

use serde_json::{json, Value as JsonValue};

use closingdesk_audit::{AuditPage, AuditQuery, EntityType, UncommittedAuditRecord};
use closingdesk_core::{AggregateRoot, DealId, DomainEvent, EngineResult, UserId};
use closingdesk_deals::{Condition, Deal, DealEvent};
use closingdesk_ledger::{AccountEvent, Transaction, TransactionEvent, TrustAccount};

use super::{Engine, Step};
use crate::store::EngineStore;

pub(crate) fn deal_summary(deal: &Deal) -> JsonValue {
    json!({
        "id": deal.id(),
        "property_id": deal.property_id(),
        "status": deal.status(),
        "offer_price": deal.offer_price(),
        "closing_date": deal.closing_date(),
        "conditions": deal.conditions().len(),
        "snapshot_version": deal.snapshot_version(),
        "version": deal.version(),
    })
}

pub(crate) fn condition_summary(deal_id: &DealId, condition: &Condition) -> JsonValue {
    json!({
        "id": condition.id,
        "deal_id": deal_id,
        "type": condition.condition_type,
        "description": condition.description,
        "status": condition.status,
        "deadline": condition.deadline,
        "satisfied_at": condition.satisfied_at,
    })
}

pub(crate) fn account_summary(account: &TrustAccount) -> JsonValue {
    json!({
        "id": account.id(),
        "account_number": account.account_number(),
        "holder_name": account.holder_name(),
        "balance": account.balance(),
        "status": account.status(),
        "version": account.version(),
    })
}

/// Transaction state plus the balances of every account it touched.
pub(crate) fn transaction_summary(tx: &Transaction, accounts: &[TrustAccount]) -> JsonValue {
    let mut summary = json!({
        "id": tx.id(),
        "deal_id": tx.deal_id(),
        "type": tx.transaction_type(),
        "amount": tx.amount(),
        "status": tx.status(),
        "from_account": tx.from_account(),
        "to_account": tx.to_account(),
        "failure_reason": tx.failure_reason(),
    });
    if !accounts.is_empty() {
        summary["accounts"] = accounts
            .iter()
            .map(|a| json!({ "id": a.id(), "balance": a.balance(), "status": a.status() }))
            .collect();
    }
    summary
}

fn existing<A: AggregateRoot>(state: &A, summary: impl FnOnce(&A) -> JsonValue) -> JsonValue {
    if state.version() == 0 {
        JsonValue::Null
    } else {
        summary(state)
    }
}

pub(crate) fn deal_record(actor: &UserId, step: &Step<Deal>) -> UncommittedAuditRecord {
    let deal_id = step.after.id();
    let (entity_type, entity_id, before, after) = match &step.event {
        DealEvent::ConditionAdded(e) => (
            EntityType::Condition,
            e.condition.id.to_string(),
            JsonValue::Null,
            condition_summary(deal_id, &e.condition),
        ),
        DealEvent::ConditionUpdated(e) => (
            EntityType::Condition,
            e.after.id.to_string(),
            condition_summary(deal_id, &e.before),
            condition_summary(deal_id, &e.after),
        ),
        DealEvent::DealDeleted(_) => (
            EntityType::Deal,
            deal_id.to_string(),
            deal_summary(&step.before),
            JsonValue::Null,
        ),
        _ => (
            EntityType::Deal,
            deal_id.to_string(),
            existing(&step.before, deal_summary),
            deal_summary(&step.after),
        ),
    };

    UncommittedAuditRecord {
        entity_type,
        entity_id,
        event: step.event.event_type().to_string(),
        before,
        after,
        timestamp: step.event.occurred_at(),
        actor_id: actor.clone(),
    }
}

pub(crate) fn account_record(actor: &UserId, step: &Step<TrustAccount>) -> UncommittedAuditRecord {
    let event: &AccountEvent = &step.event;
    UncommittedAuditRecord {
        entity_type: EntityType::TrustAccount,
        entity_id: step.after.id().to_string(),
        event: event.event_type().to_string(),
        before: existing(&step.before, account_summary),
        after: account_summary(&step.after),
        timestamp: event.occurred_at(),
        actor_id: actor.clone(),
    }
}

/// `accounts_before`/`accounts_after` are the accounts the event posted to.
pub(crate) fn transaction_record(
    actor: &UserId,
    step: &Step<Transaction>,
    accounts_before: &[TrustAccount],
    accounts_after: &[TrustAccount],
) -> UncommittedAuditRecord {
    let event: &TransactionEvent = &step.event;
    let before = if step.before.version() == 0 {
        JsonValue::Null
    } else {
        transaction_summary(&step.before, accounts_before)
    };

    let mut after = transaction_summary(&step.after, accounts_after);
    if let TransactionEvent::TransactionReversed(e) = event {
        if let Some(note) = &e.note {
            after["note"] = JsonValue::from(note.as_str());
        }
    }

    UncommittedAuditRecord {
        entity_type: EntityType::Transaction,
        entity_id: step.after.id().to_string(),
        event: event.event_type().to_string(),
        before,
        after,
        timestamp: event.occurred_at(),
        actor_id: actor.clone(),
    }
}

impl<S: EngineStore> Engine<S> {
    /// Audit records matching `query`, newest first.
    pub fn query_audit(&self, query: &AuditQuery) -> EngineResult<AuditPage> {
        self.store.query_audit(query)
    }
}
