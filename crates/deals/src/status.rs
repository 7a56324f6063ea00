use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use closingdesk_core::EngineError;

/// Deal status lifecycle.
///
/// `draft → submitted → conditional → firm → closing → completed`, with
/// `cancelled` and `expired` reachable from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Draft,
    Submitted,
    Conditional,
    Firm,
    Closing,
    Completed,
    Cancelled,
    Expired,
}

impl DealStatus {
    pub const ALL: [DealStatus; 8] = [
        DealStatus::Draft,
        DealStatus::Submitted,
        DealStatus::Conditional,
        DealStatus::Firm,
        DealStatus::Closing,
        DealStatus::Completed,
        DealStatus::Cancelled,
        DealStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DealStatus::Draft => "draft",
            DealStatus::Submitted => "submitted",
            DealStatus::Conditional => "conditional",
            DealStatus::Firm => "firm",
            DealStatus::Closing => "closing",
            DealStatus::Completed => "completed",
            DealStatus::Cancelled => "cancelled",
            DealStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DealStatus::Completed | DealStatus::Cancelled | DealStatus::Expired
        )
    }

    /// Whether `self → to` is an edge of the transition table.
    ///
    /// Guards (participants, conditions, closing date, funding) are evaluated
    /// separately by the deal aggregate.
    pub fn permits(self, to: DealStatus) -> bool {
        use DealStatus::*;

        match (self, to) {
            (from, Cancelled | Expired) => !from.is_terminal(),
            (Draft, Submitted)
            | (Submitted, Conditional)
            | (Submitted, Firm)
            | (Conditional, Firm)
            | (Firm, Closing)
            | (Closing, Completed) => true,
            _ => false,
        }
    }

    /// Offer price can still be renegotiated.
    pub fn allows_price_change(self) -> bool {
        matches!(
            self,
            DealStatus::Draft | DealStatus::Submitted | DealStatus::Conditional
        )
    }

    pub fn allows_condition_add(self) -> bool {
        matches!(self, DealStatus::Draft | DealStatus::Submitted)
    }

    pub fn allows_condition_update(self) -> bool {
        matches!(self, DealStatus::Submitted | DealStatus::Conditional)
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| EngineError::validation("status", format!("unknown deal status `{s}`")))
    }
}
