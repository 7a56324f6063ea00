use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use closingdesk_core::{
    AggregateRoot, ConditionId, DealId, EngineError, EngineResult, Money, PropertyId, UserId,
};
use closingdesk_deals::{
    AddCondition, AmendDeal, ChangeStatus, Condition, ConditionChange, ConditionType, CreateDeal,
    Deal, DealCommand, DealEvent, DealStatus, DeleteDeal, NewCondition, Participants,
    UpdateCondition,
};
use closingdesk_ledger::{funded_amount, Transaction};

use super::{audit, execute, Engine};
use crate::store::{DealFilter, EngineStore, TransactionFilter, UnitOfWork};

/// Condition requested at creation or via `add_condition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl ConditionSpec {
    fn with_id(self, condition_id: ConditionId) -> NewCondition {
        NewCondition {
            condition_id,
            condition_type: self.condition_type,
            description: self.description,
            deadline: self.deadline,
        }
    }
}

/// Input for `create_deal`. Participant snapshots are supplied inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeal {
    pub property_id: PropertyId,
    #[serde(default)]
    pub offer_price: Option<Money>,
    #[serde(default)]
    pub participants: Participants,
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for `amend_deal`; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealChanges {
    #[serde(default)]
    pub offer_price: Option<Money>,
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub participants: Option<Participants>,
}

impl<S: EngineStore> Engine<S> {
    /// Create a deal in `draft`, with any initial conditions `pending`.
    #[instrument(skip_all, fields(actor = %actor, property_id = %input.property_id))]
    pub fn create_deal(&self, actor: &UserId, input: NewDeal) -> EngineResult<Deal> {
        let deal_id = DealId::generate();
        let command = DealCommand::CreateDeal(CreateDeal {
            deal_id: deal_id.clone(),
            property_id: input.property_id.clone(),
            offer_price: input.offer_price,
            participants: input.participants,
            conditions: input
                .conditions
                .into_iter()
                .map(|spec| spec.with_id(ConditionId::generate()))
                .collect(),
            closing_date: input.closing_date,
            notes: input.notes,
            occurred_at: Utc::now(),
        });

        self.run("create_deal", || {
            let current = Deal::empty(deal_id.clone(), input.property_id.clone());
            self.commit_deal(actor, &current, &command)
        })
    }

    /// Amend price, closing date, notes or participants.
    #[instrument(skip_all, fields(actor = %actor, deal_id = %deal_id))]
    pub fn amend_deal(
        &self,
        actor: &UserId,
        deal_id: &DealId,
        changes: DealChanges,
    ) -> EngineResult<Deal> {
        self.run("amend_deal", || {
            let _lock = self.deal_locks.acquire(deal_id)?;
            let current = self.require_deal(deal_id)?;
            let command = DealCommand::AmendDeal(AmendDeal {
                deal_id: deal_id.clone(),
                offer_price: changes.offer_price,
                closing_date: changes.closing_date,
                notes: changes.notes.clone(),
                participants: changes.participants.clone(),
                occurred_at: Utc::now(),
            });
            self.commit_deal(actor, &current, &command)
        })
    }

    /// Request a status transition. `completed` checks funding against the
    /// deal's completed deposits and payments.
    #[instrument(skip_all, fields(actor = %actor, deal_id = %deal_id, to = %to))]
    pub fn change_status(
        &self,
        actor: &UserId,
        deal_id: &DealId,
        to: DealStatus,
        note: Option<String>,
    ) -> EngineResult<Deal> {
        self.run("change_status", || {
            let _lock = self.deal_locks.acquire(deal_id)?;
            let current = self.require_deal(deal_id)?;
            let transactions = self
                .store
                .list_transactions(&TransactionFilter::for_deal(deal_id.clone()))?;
            let command = DealCommand::ChangeStatus(ChangeStatus {
                deal_id: deal_id.clone(),
                to,
                note: note.clone(),
                funded: funded_amount(&transactions)?,
                occurred_at: Utc::now(),
            });
            self.commit_deal(actor, &current, &command)
        })
    }

    #[instrument(skip_all, fields(actor = %actor, deal_id = %deal_id))]
    pub fn add_condition(
        &self,
        actor: &UserId,
        deal_id: &DealId,
        spec: ConditionSpec,
    ) -> EngineResult<Condition> {
        let condition_id = ConditionId::generate();
        let condition = spec.with_id(condition_id.clone());

        let deal = self.run("add_condition", || {
            let _lock = self.deal_locks.acquire(deal_id)?;
            let current = self.require_deal(deal_id)?;
            let command = DealCommand::AddCondition(AddCondition {
                deal_id: deal_id.clone(),
                condition: condition.clone(),
                occurred_at: Utc::now(),
            });
            self.commit_deal(actor, &current, &command)
        })?;

        deal.conditions().get(&condition_id).cloned().ok_or_else(|| {
            EngineError::invariant(format!("condition {condition_id} missing after commit"))
        })
    }

    /// Update a condition's status and/or description; may cascade the deal
    /// to `cancelled`. Returns the deal as it stands afterwards.
    #[instrument(
        skip_all,
        fields(actor = %actor, deal_id = %deal_id, condition_id = %condition_id, status = %change.status)
    )]
    pub fn update_condition(
        &self,
        actor: &UserId,
        deal_id: &DealId,
        condition_id: &ConditionId,
        change: ConditionChange,
    ) -> EngineResult<Deal> {
        self.run("update_condition", || {
            let _lock = self.deal_locks.acquire(deal_id)?;
            let current = self.require_deal(deal_id)?;
            let command = DealCommand::UpdateCondition(UpdateCondition {
                deal_id: deal_id.clone(),
                condition_id: condition_id.clone(),
                change: change.clone(),
                occurred_at: Utc::now(),
            });
            self.commit_deal(actor, &current, &command)
        })
    }

    /// Delete a `draft` deal that no transaction references.
    #[instrument(skip_all, fields(actor = %actor, deal_id = %deal_id))]
    pub fn delete_deal(&self, actor: &UserId, deal_id: &DealId) -> EngineResult<()> {
        self.run("delete_deal", || {
            let _lock = self.deal_locks.acquire(deal_id)?;
            let current = self.require_deal(deal_id)?;
            let has_transactions = !self
                .store
                .list_transactions(&TransactionFilter::for_deal(deal_id.clone()))?
                .is_empty();
            let command = DealCommand::DeleteDeal(DeleteDeal {
                deal_id: deal_id.clone(),
                has_transactions,
                occurred_at: Utc::now(),
            });
            self.commit_deal(actor, &current, &command).map(|_| ())
        })
    }

    pub fn get_deal(&self, deal_id: &DealId) -> EngineResult<Deal> {
        self.require_deal(deal_id)
    }

    pub fn list_deals(&self, filter: &DealFilter) -> EngineResult<Vec<Deal>> {
        self.store.list_deals(filter)
    }

    /// Transactions referencing an existing deal, newest first.
    pub fn deal_transactions(&self, deal_id: &DealId) -> EngineResult<Vec<Transaction>> {
        self.require_deal(deal_id)?;
        self.store
            .list_transactions(&TransactionFilter::for_deal(deal_id.clone()))
    }

    /// Decide, audit and commit one deal command. No-ops commit nothing.
    fn commit_deal(
        &self,
        actor: &UserId,
        current: &Deal,
        command: &DealCommand,
    ) -> EngineResult<Deal> {
        let (next, steps) = execute(current, command)?;
        if steps.is_empty() {
            return Ok(next);
        }

        let deleted = steps
            .iter()
            .any(|s| matches!(s.event, DealEvent::DealDeleted(_)));
        if !deleted {
            if let Err(err) = next.check_invariants() {
                tracing::error!(
                    deal = %serde_json::to_string(&next).unwrap_or_default(),
                    error = %err,
                    "deal invariant violated"
                );
                return Err(err);
            }
        }

        let mut unit = UnitOfWork::new();
        if deleted {
            unit.delete_deal(current);
        } else {
            unit.put_deal(next.clone(), current.version());
        }
        for step in &steps {
            unit.record(audit::deal_record(actor, step));
        }
        self.store.commit(unit)?;

        tracing::debug!(
            deal_id = %next.id(),
            status = %next.status(),
            version = next.version(),
            events = steps.len(),
            "deal committed"
        );
        Ok(next)
    }
}
