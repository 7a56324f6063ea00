//! Deal lifecycle: the deal state machine and its condition tracker.

pub mod condition;
pub mod deal;
pub mod participant;
pub mod status;

pub use condition::{
    Cascade, Condition, ConditionChange, ConditionStatus, ConditionTracker, ConditionType,
    ConditionUpdate,
};
pub use deal::{
    AddCondition, AmendDeal, ChangeStatus, CreateDeal, Deal, DealCommand, DealEvent, DeleteDeal,
    NewCondition, StatusHistoryEntry, UpdateCondition,
};
pub use participant::{Participant, ParticipantRole, ParticipantSnapshot, Participants};
pub use status::DealStatus;
