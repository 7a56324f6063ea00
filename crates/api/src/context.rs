use closingdesk_core::UserId;

/// Acting user for a request.
///
/// Present on every route except `/health`; recorded as `actor_id` on the
/// audit records the request produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor_id: UserId,
}

impl ActorContext {
    pub fn new(actor_id: UserId) -> Self {
        Self { actor_id }
    }

    pub fn actor_id(&self) -> &UserId {
        &self.actor_id
    }
}
