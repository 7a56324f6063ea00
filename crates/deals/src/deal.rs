use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use closingdesk_core::{
    Aggregate, AggregateRoot, AppendOnlyLog, ConditionId, DealId, DomainEvent, EngineError,
    EngineResult, Money, PropertyId,
};

use crate::condition::{
    Condition, ConditionChange, ConditionStatus, ConditionTracker, ConditionType, ConditionUpdate,
};
use crate::participant::{require_principals, validate_participants, Participants};
use crate::status::DealStatus;

/// One entry of a deal's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: DealStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

/// Aggregate root: Deal.
///
/// Owns its conditions and status history outright. Ledger entities reference
/// a deal by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    id: DealId,
    property_id: PropertyId,
    offer_price: Option<Money>,
    status: DealStatus,
    participants: Participants,
    conditions: ConditionTracker,
    closing_date: Option<NaiveDate>,
    notes: Option<String>,
    status_history: AppendOnlyLog<StatusHistoryEntry>,
    snapshot_timestamp: DateTime<Utc>,
    snapshot_version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Deal {
    /// Empty, not-yet-created aggregate (version 0).
    pub fn empty(id: DealId, property_id: PropertyId) -> Self {
        Self {
            id,
            property_id,
            offer_price: None,
            status: DealStatus::Draft,
            participants: Participants::new(),
            conditions: ConditionTracker::new(),
            closing_date: None,
            notes: None,
            status_history: AppendOnlyLog::new(),
            snapshot_timestamp: DateTime::<Utc>::MIN_UTC,
            snapshot_version: 0,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> &DealId {
        &self.id
    }

    pub fn property_id(&self) -> &PropertyId {
        &self.property_id
    }

    pub fn offer_price(&self) -> Option<Money> {
        self.offer_price
    }

    pub fn status(&self) -> DealStatus {
        self.status
    }

    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    pub fn conditions(&self) -> &ConditionTracker {
        &self.conditions
    }

    pub fn closing_date(&self) -> Option<NaiveDate> {
        self.closing_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status_history(&self) -> &AppendOnlyLog<StatusHistoryEntry> {
        &self.status_history
    }

    pub fn snapshot_timestamp(&self) -> DateTime<Utc> {
        self.snapshot_timestamp
    }

    pub fn snapshot_version(&self) -> u32 {
        self.snapshot_version
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

    /// Structural consistency of the status history and conditions.
    pub fn check_invariants(&self) -> EngineResult<()> {
        if !self.is_created() {
            return Ok(());
        }

        match self.status_history.last() {
            Some(last) if last.status == self.status => {}
            Some(last) => {
                return Err(EngineError::invariant(format!(
                    "deal {}: last history entry is {} but status is {}",
                    self.id, last.status, self.status
                )));
            }
            None => {
                return Err(EngineError::invariant(format!(
                    "deal {}: status history is empty",
                    self.id
                )));
            }
        }

        let history = self.status_history.as_slice();
        if history.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
            return Err(EngineError::invariant(format!(
                "deal {}: status history is not ordered in time",
                self.id
            )));
        }

        let mut seen: Vec<&ConditionId> = Vec::with_capacity(self.conditions.len());
        for c in self.conditions.iter() {
            if seen.contains(&&c.id) {
                return Err(EngineError::invariant(format!(
                    "deal {}: duplicate condition id {}",
                    self.id, c.id
                )));
            }
            seen.push(&c.id);
        }

        Ok(())
    }

    /// Timestamp for the next history entry, clamped so history never goes back in time.
    fn history_time(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.status_history.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        }
    }
}

impl AggregateRoot for Deal {
    type Id = DealId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Condition as requested on creation or `add_condition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCondition {
    pub condition_id: ConditionId,
    pub condition_type: ConditionType,
    pub description: String,
    pub deadline: Option<NaiveDate>,
}

/// Command: CreateDeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeal {
    pub deal_id: DealId,
    pub property_id: PropertyId,
    pub offer_price: Option<Money>,
    pub participants: Participants,
    pub conditions: Vec<NewCondition>,
    pub closing_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AmendDeal. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendDeal {
    pub deal_id: DealId,
    pub offer_price: Option<Money>,
    pub closing_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub participants: Option<Participants>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub deal_id: DealId,
    pub to: DealStatus,
    pub note: Option<String>,
    /// Sum of completed deposit/payment transactions for the deal.
    pub funded: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddCondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCondition {
    pub deal_id: DealId,
    pub condition: NewCondition,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateCondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCondition {
    pub deal_id: DealId,
    pub condition_id: ConditionId,
    pub change: ConditionChange,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteDeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDeal {
    pub deal_id: DealId,
    pub has_transactions: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealCommand {
    CreateDeal(CreateDeal),
    AmendDeal(AmendDeal),
    ChangeStatus(ChangeStatus),
    AddCondition(AddCondition),
    UpdateCondition(UpdateCondition),
    DeleteDeal(DeleteDeal),
}

/// Event: DealCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCreated {
    pub deal_id: DealId,
    pub property_id: PropertyId,
    pub offer_price: Option<Money>,
    pub participants: Participants,
    pub conditions: Vec<Condition>,
    pub closing_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DealAmended. Only the fields that changed are `Some`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealAmended {
    pub deal_id: DealId,
    pub offer_price: Option<Money>,
    pub closing_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub participants: Option<Participants>,
    pub snapshot_version: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub deal_id: DealId,
    pub from: DealStatus,
    pub to: DealStatus,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConditionAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionAdded {
    pub deal_id: DealId,
    pub condition: Condition,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConditionUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionUpdated {
    pub deal_id: DealId,
    pub before: Condition,
    pub after: Condition,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DealDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealDeleted {
    pub deal_id: DealId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealEvent {
    DealCreated(DealCreated),
    DealAmended(DealAmended),
    StatusChanged(StatusChanged),
    ConditionAdded(ConditionAdded),
    ConditionUpdated(ConditionUpdated),
    DealDeleted(DealDeleted),
}

impl DomainEvent for DealEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DealEvent::DealCreated(_) => "deal.created",
            DealEvent::DealAmended(_) => "deal.amended",
            DealEvent::StatusChanged(_) => "deal.status_changed",
            DealEvent::ConditionAdded(_) => "deal.condition_added",
            DealEvent::ConditionUpdated(_) => "deal.condition_updated",
            DealEvent::DealDeleted(_) => "deal.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DealEvent::DealCreated(e) => e.occurred_at,
            DealEvent::DealAmended(e) => e.occurred_at,
            DealEvent::StatusChanged(e) => e.occurred_at,
            DealEvent::ConditionAdded(e) => e.occurred_at,
            DealEvent::ConditionUpdated(e) => e.occurred_at,
            DealEvent::DealDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Deal {
    type Command = DealCommand;
    type Event = DealEvent;
    type Error = EngineError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DealEvent::DealCreated(e) => {
                self.id = e.deal_id.clone();
                self.property_id = e.property_id.clone();
                self.offer_price = e.offer_price;
                self.status = DealStatus::Draft;
                self.participants = e.participants.clone();
                self.conditions = ConditionTracker::new();
                for c in &e.conditions {
                    self.conditions.push(c.clone());
                }
                self.closing_date = e.closing_date;
                self.notes = e.notes.clone();
                self.status_history.append(StatusHistoryEntry {
                    status: DealStatus::Draft,
                    timestamp: e.occurred_at,
                    note: None,
                });
                self.snapshot_timestamp = e.occurred_at;
                self.snapshot_version = 1;
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
            }
            DealEvent::DealAmended(e) => {
                if let Some(price) = e.offer_price {
                    self.offer_price = Some(price);
                }
                if let Some(date) = e.closing_date {
                    self.closing_date = Some(date);
                }
                if let Some(notes) = &e.notes {
                    self.notes = Some(notes.clone());
                }
                if let Some(participants) = &e.participants {
                    self.participants = participants.clone();
                    self.snapshot_timestamp = e.occurred_at;
                }
                self.snapshot_version = e.snapshot_version;
                self.updated_at = e.occurred_at;
            }
            DealEvent::StatusChanged(e) => {
                self.status = e.to;
                self.status_history.append(StatusHistoryEntry {
                    status: e.to,
                    timestamp: e.occurred_at,
                    note: e.note.clone(),
                });
                self.updated_at = e.occurred_at;
            }
            DealEvent::ConditionAdded(e) => {
                self.conditions.push(e.condition.clone());
                self.updated_at = e.occurred_at;
            }
            DealEvent::ConditionUpdated(e) => {
                self.conditions.replace(e.after.clone());
                self.updated_at = e.occurred_at;
            }
            DealEvent::DealDeleted(e) => {
                self.updated_at = e.occurred_at;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DealCommand::CreateDeal(cmd) => self.handle_create(cmd),
            DealCommand::AmendDeal(cmd) => self.handle_amend(cmd),
            DealCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
            DealCommand::AddCondition(cmd) => self.handle_add_condition(cmd),
            DealCommand::UpdateCondition(cmd) => self.handle_update_condition(cmd),
            DealCommand::DeleteDeal(cmd) => self.handle_delete(cmd),
        }
    }
}

fn new_condition(spec: &NewCondition, at: DateTime<Utc>) -> Condition {
    Condition {
        id: spec.condition_id.clone(),
        condition_type: spec.condition_type,
        description: spec.description.clone(),
        deadline: spec.deadline,
        status: ConditionStatus::Pending,
        satisfied_at: None,
        created_at: at,
    }
}

fn ensure_positive_price(price: Money) -> EngineResult<()> {
    if !price.is_positive() {
        return Err(EngineError::validation("offer_price", "offer price must be positive"));
    }
    Ok(())
}

impl Deal {
    fn ensure_created(&self) -> EngineResult<()> {
        if !self.is_created() {
            return Err(EngineError::not_found("deal", &self.id));
        }
        Ok(())
    }

    fn ensure_deal_id(&self, deal_id: &DealId) -> EngineResult<()> {
        if &self.id != deal_id {
            return Err(EngineError::invariant("deal_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateDeal) -> EngineResult<Vec<DealEvent>> {
        if self.is_created() {
            return Err(EngineError::validation("deal_id", "deal already exists"));
        }
        self.ensure_deal_id(&cmd.deal_id)?;

        if let Some(price) = cmd.offer_price {
            ensure_positive_price(price)?;
        }
        validate_participants(&cmd.participants)?;

        let mut conditions: Vec<Condition> = Vec::with_capacity(cmd.conditions.len());
        for spec in &cmd.conditions {
            if conditions.iter().any(|c| c.id == spec.condition_id) {
                return Err(EngineError::validation(
                    "conditions",
                    format!("duplicate condition id {}", spec.condition_id),
                ));
            }
            conditions.push(new_condition(spec, cmd.occurred_at));
        }

        Ok(vec![DealEvent::DealCreated(DealCreated {
            deal_id: cmd.deal_id.clone(),
            property_id: cmd.property_id.clone(),
            offer_price: cmd.offer_price,
            participants: cmd.participants.clone(),
            conditions,
            closing_date: cmd.closing_date,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_amend(&self, cmd: &AmendDeal) -> EngineResult<Vec<DealEvent>> {
        self.ensure_created()?;
        self.ensure_deal_id(&cmd.deal_id)?;

        if self.status.is_terminal() {
            return Err(EngineError::not_permitted("amend", self.status));
        }

        if cmd.offer_price.is_none()
            && cmd.closing_date.is_none()
            && cmd.notes.is_none()
            && cmd.participants.is_none()
        {
            return Err(EngineError::validation("body", "no changes supplied"));
        }

        if let Some(price) = cmd.offer_price {
            ensure_positive_price(price)?;
            if !self.status.allows_price_change() && Some(price) != self.offer_price {
                return Err(EngineError::not_permitted("amend offer_price", self.status));
            }
        }

        let mut snapshot_version = self.snapshot_version;
        if let Some(participants) = &cmd.participants {
            validate_participants(participants)?;
            if self.status != DealStatus::Draft {
                require_principals(participants)?;
            }
            snapshot_version += 1;
        }

        Ok(vec![DealEvent::DealAmended(DealAmended {
            deal_id: cmd.deal_id.clone(),
            offer_price: cmd.offer_price,
            closing_date: cmd.closing_date,
            notes: cmd.notes.clone(),
            participants: cmd.participants.clone(),
            snapshot_version,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeStatus) -> EngineResult<Vec<DealEvent>> {
        use DealStatus::*;

        self.ensure_created()?;
        self.ensure_deal_id(&cmd.deal_id)?;

        let from = self.status;
        if !from.permits(cmd.to) {
            return Err(EngineError::invalid_transition("deal", from, cmd.to));
        }

        let target = match (from, cmd.to) {
            (Draft, Submitted) => {
                require_principals(&self.participants)?;
                if self.offer_price.is_none() {
                    return Err(EngineError::validation(
                        "offer_price",
                        "an offer price is required before submission",
                    ));
                }
                Submitted
            }
            (Submitted, Conditional) if self.conditions.is_empty() => Firm,
            (Submitted, Conditional) => Conditional,
            (Submitted | Conditional, Firm) => {
                if let Some(blocking) = self.conditions.first_unresolved() {
                    return Err(EngineError::ConditionNotSatisfied {
                        condition_id: blocking.id.to_string(),
                        condition_type: blocking.condition_type.to_string(),
                    });
                }
                Firm
            }
            (Firm, Closing) => {
                let date = self.closing_date.ok_or_else(|| {
                    EngineError::validation("closing_date", "a closing date is required")
                })?;
                if date < cmd.occurred_at.date_naive() {
                    return Err(EngineError::validation(
                        "closing_date",
                        format!("closing date {date} is in the past"),
                    ));
                }
                Closing
            }
            (Closing, Completed) => {
                let required = self.offer_price.ok_or_else(|| {
                    EngineError::invariant(format!("deal {} is closing without an offer price", self.id))
                })?;
                if cmd.funded < required {
                    return Err(EngineError::IncompleteFunding {
                        required,
                        funded: cmd.funded,
                    });
                }
                Completed
            }
            (_, to @ (Cancelled | Expired)) => to,
            (from, to) => return Err(EngineError::invalid_transition("deal", from, to)),
        };

        Ok(vec![DealEvent::StatusChanged(StatusChanged {
            deal_id: cmd.deal_id.clone(),
            from,
            to: target,
            note: cmd.note.clone(),
            occurred_at: self.history_time(cmd.occurred_at),
        })])
    }

    fn handle_add_condition(&self, cmd: &AddCondition) -> EngineResult<Vec<DealEvent>> {
        self.ensure_created()?;
        self.ensure_deal_id(&cmd.deal_id)?;

        if !self.status.allows_condition_add() {
            return Err(EngineError::not_permitted("add_condition", self.status));
        }
        if self.conditions.contains(&cmd.condition.condition_id) {
            return Err(EngineError::validation(
                "condition_id",
                format!("condition {} already exists", cmd.condition.condition_id),
            ));
        }

        Ok(vec![DealEvent::ConditionAdded(ConditionAdded {
            deal_id: cmd.deal_id.clone(),
            condition: new_condition(&cmd.condition, cmd.occurred_at),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_condition(&self, cmd: &UpdateCondition) -> EngineResult<Vec<DealEvent>> {
        self.ensure_created()?;
        self.ensure_deal_id(&cmd.deal_id)?;

        if !self.status.allows_condition_update() {
            return Err(EngineError::not_permitted("update_condition", self.status));
        }

        let plan = self.conditions.plan_update(
            &cmd.condition_id,
            &cmd.change,
            self.status,
            cmd.occurred_at,
        )?;

        let (before, after, cascade) = match plan {
            ConditionUpdate::Unchanged(_) => return Ok(vec![]),
            ConditionUpdate::Changed {
                before,
                after,
                cascade,
            } => (before, after, cascade),
        };

        let mut events = vec![DealEvent::ConditionUpdated(ConditionUpdated {
            deal_id: cmd.deal_id.clone(),
            before,
            after,
            occurred_at: cmd.occurred_at,
        })];

        if let Some(cascade) = cascade {
            events.push(DealEvent::StatusChanged(StatusChanged {
                deal_id: cmd.deal_id.clone(),
                from: self.status,
                to: cascade.to,
                note: Some(cascade.note),
                occurred_at: self.history_time(cmd.occurred_at),
            }));
        }

        Ok(events)
    }

    fn handle_delete(&self, cmd: &DeleteDeal) -> EngineResult<Vec<DealEvent>> {
        self.ensure_created()?;
        self.ensure_deal_id(&cmd.deal_id)?;

        if self.status != DealStatus::Draft {
            return Err(EngineError::not_permitted("delete", self.status));
        }
        if cmd.has_transactions {
            return Err(EngineError::not_permitted(
                "delete",
                "transactions reference the deal",
            ));
        }

        Ok(vec![DealEvent::DealDeleted(DealDeleted {
            deal_id: cmd.deal_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
