//! Committed match types

use crate::ids::{MatchId, ParticipantId};
use serde::{Deserialize, Serialize};

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    /// Created by the engine, awaiting confirmation
    Proposed,
    /// Accepted by the participants
    Confirmed,
    /// No longer binding; members may be matched again
    Expired,
}

impl MatchStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, MatchStatus::Expired)
    }

    /// Allowed transitions: Proposed -> Confirmed | Expired, Confirmed -> Expired
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Proposed, MatchStatus::Confirmed)
                | (MatchStatus::Proposed, MatchStatus::Expired)
                | (MatchStatus::Confirmed, MatchStatus::Expired)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Proposed => "PROPOSED",
            MatchStatus::Confirmed => "CONFIRMED",
            MatchStatus::Expired => "EXPIRED",
        }
    }
}

/// A group of participants paired by the engine
///
/// Members keep the arrival order they had in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub match_id: MatchId,
    pub members: Vec<ParticipantId>,
    pub status: MatchStatus,
    pub created_at: i64, // Unix nanos
    pub updated_at: i64, // Unix nanos
}

impl Match {
    pub fn new(members: Vec<ParticipantId>, timestamp: i64) -> Self {
        Self {
            match_id: MatchId::new(),
            members,
            status: MatchStatus::Proposed,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}
