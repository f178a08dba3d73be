//! Event structures pushed to participants
//!
//! Event names and payload shapes are a client contract: field names are
//! camelCase and must not change without a client release.

use serde::{Deserialize, Serialize};
use types::ids::{MatchId, ParticipantId};
use types::match_record::Match;

/// Sent to every member of a newly committed match
pub const MATCH_FOUND: &str = "match_found";

/// Sent to a participant whose queue entry was cancelled
pub const QUEUE_CANCELLED: &str = "queue_cancelled";

/// Sent on a fresh connection before registration
pub const CONNECTED: &str = "connected";

/// Acknowledges a `register` message
pub const REGISTERED: &str = "registered";

/// Match found payload: `{"matchId": ..., "members": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFoundEvent {
    pub match_id: MatchId,
    pub members: Vec<ParticipantId>,
}

impl From<&Match> for MatchFoundEvent {
    fn from(m: &Match) -> Self {
        Self {
            match_id: m.match_id,
            members: m.members.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCancelledEvent {
    pub participant_id: ParticipantId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredEvent {
    pub participant_id: ParticipantId,
}

/// One frame on a participant's connection: `{"event": ..., "payload": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub event: String,
    pub payload: serde_json::Value,
}

impl OutboundMessage {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// Serialized text frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
