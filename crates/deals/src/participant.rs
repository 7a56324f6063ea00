use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use closingdesk_core::{EngineError, EngineResult, UserId};

/// Role a participant plays on a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Buyer,
    Seller,
    BuyerAgent,
    SellerAgent,
    BuyerLawyer,
    SellerLawyer,
}

impl ParticipantRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantRole::Buyer => "buyer",
            ParticipantRole::Seller => "seller",
            ParticipantRole::BuyerAgent => "buyer_agent",
            ParticipantRole::SellerAgent => "seller_agent",
            ParticipantRole::BuyerLawyer => "buyer_lawyer",
            ParticipantRole::SellerLawyer => "seller_lawyer",
        }
    }
}

/// Point-in-time copy of a participant's contact and licensing details.
///
/// Captured when the deal is created or its participants are amended; never
/// refreshed from the live user record afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub brokerage: Option<String>,
    #[serde(default)]
    pub law_firm: Option<String>,
}

/// Live user reference plus the snapshot taken at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub snapshot: ParticipantSnapshot,
}

pub type Participants = BTreeMap<ParticipantRole, Participant>;

pub(crate) fn validate_participants(participants: &Participants) -> EngineResult<()> {
    for (role, participant) in participants {
        if participant.snapshot.name.trim().is_empty() {
            return Err(EngineError::validation(
                format!("participants.{}.name", role.as_str()),
                "participant name must not be blank",
            ));
        }
    }
    Ok(())
}

/// Both principal parties must be present before a deal leaves `draft`.
pub(crate) fn require_principals(participants: &Participants) -> EngineResult<()> {
    for role in [ParticipantRole::Buyer, ParticipantRole::Seller] {
        if !participants.contains_key(&role) {
            return Err(EngineError::validation(
                format!("participants.{}", role.as_str()),
                format!("a {} is required", role.as_str()),
            ));
        }
    }
    Ok(())
}
