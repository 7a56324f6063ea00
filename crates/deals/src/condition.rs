//! Condition tracker: the per-deal checklist of contingencies.

use core::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use closingdesk_core::{ConditionId, EngineError, EngineResult};

use crate::status::DealStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Financing,
    Inspection,
    Appraisal,
    SaleOfProperty,
    Other,
}

impl ConditionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::Financing => "financing",
            ConditionType::Inspection => "inspection",
            ConditionType::Appraisal => "appraisal",
            ConditionType::SaleOfProperty => "sale_of_property",
            ConditionType::Other => "other",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    Pending,
    Satisfied,
    Waived,
    Failed,
}

impl ConditionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionStatus::Pending => "pending",
            ConditionStatus::Satisfied => "satisfied",
            ConditionStatus::Waived => "waived",
            ConditionStatus::Failed => "failed",
        }
    }

    /// Satisfied or waived: no longer blocks the deal from going firm.
    pub fn is_resolved(self) -> bool {
        matches!(self, ConditionStatus::Satisfied | ConditionStatus::Waived)
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub description: String,
    pub deadline: Option<NaiveDate>,
    pub status: ConditionStatus,
    /// Set once, when the status first leaves `pending`.
    pub satisfied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Requested change to a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionChange {
    pub status: ConditionStatus,
    pub description: Option<String>,
}

/// Deal status change forced by a condition update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cascade {
    pub to: DealStatus,
    pub note: String,
}

/// Outcome of planning a condition update (no state is touched).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionUpdate {
    /// Re-applying the current status: nothing to record.
    Unchanged(Condition),
    Changed {
        before: Condition,
        after: Condition,
        cascade: Option<Cascade>,
    },
}

/// Ordered conditions owned by a single deal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionTracker {
    conditions: Vec<Condition>,
}

impl ConditionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Condition> {
        self.conditions.iter()
    }

    pub fn get(&self, id: &ConditionId) -> Option<&Condition> {
        self.conditions.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &ConditionId) -> bool {
        self.get(id).is_some()
    }

    /// First condition (in insertion order) that still blocks `firm`.
    pub fn first_unresolved(&self) -> Option<&Condition> {
        self.conditions.iter().find(|c| !c.status.is_resolved())
    }

    pub fn all_resolved(&self) -> bool {
        self.first_unresolved().is_none()
    }

    /// Plan an update against `deal_status`, evaluating the failure cascade.
    ///
    /// A condition's status is final once it has left `pending`; only the
    /// description may still change.
    pub fn plan_update(
        &self,
        id: &ConditionId,
        change: &ConditionChange,
        deal_status: DealStatus,
        at: DateTime<Utc>,
    ) -> EngineResult<ConditionUpdate> {
        let current = self
            .get(id)
            .ok_or_else(|| EngineError::not_found("condition", id))?;

        let description_changed = change
            .description
            .as_ref()
            .is_some_and(|d| d != &current.description);

        if change.status == current.status {
            if !description_changed {
                return Ok(ConditionUpdate::Unchanged(current.clone()));
            }
            let mut after = current.clone();
            after.description = change.description.clone().unwrap_or_default();
            return Ok(ConditionUpdate::Changed {
                before: current.clone(),
                after,
                cascade: None,
            });
        }

        if current.status != ConditionStatus::Pending || change.status == ConditionStatus::Pending {
            return Err(EngineError::invalid_transition(
                "condition",
                current.status,
                change.status,
            ));
        }

        let mut after = current.clone();
        after.status = change.status;
        after.satisfied_at = Some(at);
        if let Some(description) = &change.description {
            after.description = description.clone();
        }

        let cascade = (change.status == ConditionStatus::Failed
            && deal_status == DealStatus::Conditional)
            .then(|| Cascade {
                to: DealStatus::Cancelled,
                note: format!("condition failed: {id}"),
            });

        Ok(ConditionUpdate::Changed {
            before: current.clone(),
            after,
            cascade,
        })
    }

    pub(crate) fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub(crate) fn replace(&mut self, condition: Condition) {
        if let Some(slot) = self.conditions.iter_mut().find(|c| c.id == condition.id) {
            *slot = condition;
        }
    }
}
