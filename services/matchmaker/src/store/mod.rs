//! Match store boundary
//!
//! The engine and the request surface share one store. Every mutation goes
//! through the transition primitives below so a participant can never be
//! cancelled and matched at the same time.

pub mod memory;

use async_trait::async_trait;
use types::errors::StoreError;
use types::ids::{MatchId, ParticipantId};
use types::match_record::{Match, MatchStatus};
use types::participant::{MatchAttributes, Participant};

pub use memory::InMemoryMatchStore;

/// Selects which waiting participants a fetch returns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitingFilter {
    /// Only participants with exactly these attributes; `None` means all
    pub attributes: Option<MatchAttributes>,
}

impl WaitingFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_attributes(attributes: MatchAttributes) -> Self {
        Self {
            attributes: Some(attributes),
        }
    }

    pub fn accepts(&self, participant: &Participant) -> bool {
        self.attributes
            .as_ref()
            .map_or(true, |attrs| attrs.is_compatible(&participant.attributes))
    }
}

/// Result of an all-or-nothing Waiting -> Matched transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Every member is now Matched
    Committed,
    /// Nothing changed; these members were no longer Waiting
    Conflict { ineligible: Vec<ParticipantId> },
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Waiting participants, oldest enqueue first
    async fn fetch_waiting(&self, filter: &WaitingFilter) -> Result<Vec<Participant>, StoreError>;

    /// Atomically move every member from Waiting to Matched, or none of them
    async fn transition_to_matched(
        &self,
        members: &[ParticipantId],
    ) -> Result<TransitionOutcome, StoreError>;

    /// Write the Proposed match record for members that were just transitioned
    async fn create_match(&self, members: &[ParticipantId]) -> Result<Match, StoreError>;

    /// Undo a transition whose match record could not be written
    async fn release_to_waiting(&self, members: &[ParticipantId]) -> Result<(), StoreError>;

    /// Waiting -> Cancelled
    async fn mark_cancelled(&self, participant: &ParticipantId) -> Result<Participant, StoreError>;

    /// Add (or re-add after a terminal state) a participant to the pool
    async fn enqueue(
        &self,
        participant: ParticipantId,
        attributes: MatchAttributes,
        timestamp: i64,
    ) -> Result<Participant, StoreError>;

    async fn participant(&self, participant: &ParticipantId) -> Result<Participant, StoreError>;

    async fn get_match(&self, match_id: &MatchId) -> Result<Match, StoreError>;

    async fn set_match_status(
        &self,
        match_id: &MatchId,
        status: MatchStatus,
    ) -> Result<Match, StoreError>;

    /// Expire every Proposed match created before `created_before` (Unix
    /// nanos), freeing its members to enqueue again
    async fn expire_proposed(&self, created_before: i64) -> Result<Vec<Match>, StoreError>;
}
