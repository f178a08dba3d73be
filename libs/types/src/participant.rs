//! Participant lifecycle types
//!
//! A participant enters the pool as `Waiting` and leaves it exactly once,
//! either by being paired (`Matched`) or by cancelling (`Cancelled`).

use crate::ids::{MatchId, ParticipantId};
use serde::{Deserialize, Serialize};

/// Attributes that decide which participants may be paired together.
///
/// Two participants are compatible when their attributes are equal;
/// an absent attribute only matches another absent attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl MatchAttributes {
    pub fn new(category: Option<String>, region: Option<String>) -> Self {
        Self { category, region }
    }

    pub fn with_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            region: None,
        }
    }

    /// Whether two attribute sets may share a match
    pub fn is_compatible(&self, other: &MatchAttributes) -> bool {
        self == other
    }
}

/// Participant status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParticipantStatus {
    /// In the pool, eligible for pairing
    Waiting,
    /// Placed into a match (terminal)
    Matched,
    /// Left the pool before pairing (terminal)
    Cancelled,
}

impl ParticipantStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, ParticipantStatus::Matched | ParticipantStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Waiting => "WAITING",
            ParticipantStatus::Matched => "MATCHED",
            ParticipantStatus::Cancelled => "CANCELLED",
        }
    }
}

/// A pool entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub attributes: MatchAttributes,
    pub status: ParticipantStatus,
    pub enqueued_at: i64, // Unix nanos
    pub updated_at: i64,  // Unix nanos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
}

impl Participant {
    /// Create a new waiting participant
    pub fn new(participant_id: ParticipantId, attributes: MatchAttributes, timestamp: i64) -> Self {
        Self {
            participant_id,
            attributes,
            status: ParticipantStatus::Waiting,
            enqueued_at: timestamp,
            updated_at: timestamp,
            match_id: None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.status == ParticipantStatus::Waiting
    }

    /// Arrival ordering: oldest first, ties broken by id
    pub fn arrival_key(&self) -> (i64, &ParticipantId) {
        (self.enqueued_at, &self.participant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_participant_is_waiting() {
        let p = Participant::new(ParticipantId::new("a"), MatchAttributes::default(), 100);
        assert!(p.is_waiting());
        assert_eq!(p.enqueued_at, 100);
        assert!(p.match_id.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ParticipantStatus::Waiting.is_terminal());
        assert!(ParticipantStatus::Matched.is_terminal());
        assert!(ParticipantStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_attribute_compatibility() {
        let ranked = MatchAttributes::with_category("ranked");
        let casual = MatchAttributes::with_category("casual");
        assert!(ranked.is_compatible(&MatchAttributes::with_category("ranked")));
        assert!(!ranked.is_compatible(&casual));
        assert!(!ranked.is_compatible(&MatchAttributes::default()));
        assert!(MatchAttributes::default().is_compatible(&MatchAttributes::default()));
    }

    #[test]
    fn test_participant_wire_shape() {
        let p = Participant::new(
            ParticipantId::new("alice"),
            MatchAttributes::with_category("ranked"),
            1708123456789000000,
        );
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["participantId"], "alice");
        assert_eq!(json["status"], "WAITING");
        assert_eq!(json["attributes"]["category"], "ranked");
        assert!(json["attributes"].get("region").is_none());
        assert!(json.get("matchId").is_none());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn participant_survives_wire_round_trip(
                id in "[a-z0-9_-]{1,16}",
                category in proptest::option::of("[a-z]{1,8}"),
                region in proptest::option::of("[a-z]{2}-[a-z]{4}"),
                enqueued_at in any::<i64>(),
            ) {
                let original = Participant::new(
                    ParticipantId::new(id),
                    MatchAttributes::new(category, region),
                    enqueued_at,
                );
                let json = serde_json::to_string(&original).unwrap();
                let decoded: Participant = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(&decoded, &original);
                prop_assert!(decoded.attributes.is_compatible(&original.attributes));
            }

            #[test]
            fn arrival_order_is_total(a in any::<i64>(), b in any::<i64>()) {
                let attrs = MatchAttributes::default();
                let first = Participant::new(ParticipantId::new("x"), attrs.clone(), a);
                let second = Participant::new(ParticipantId::new("y"), attrs, b);
                prop_assert_ne!(first.arrival_key(), second.arrival_key());
                prop_assert_eq!(first.arrival_key() < second.arrival_key(), a < b || (a == b));
            }
        }
    }
}
