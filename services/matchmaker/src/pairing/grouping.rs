//! Fixed-size group formation
//!
//! Within each partition, consecutive entries are grouped greedily in
//! arrival order. Whatever is left over (fewer than `match_size`) stays in
//! the pool for the next tick.

use types::ids::ParticipantId;
use types::participant::{MatchAttributes, Participant};

use super::compatibility::partition;

/// A candidate match, not yet committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub attributes: MatchAttributes,
    /// Members in arrival order
    pub members: Vec<ParticipantId>,
    /// Enqueue time of the oldest member (Unix nanos)
    pub oldest_enqueued_at: i64,
}

/// Result of planning one tick
#[derive(Debug, Clone, Default)]
pub struct PairingPlan {
    /// Groups ordered by their oldest member, so the longest waiters commit first
    pub groups: Vec<Group>,
    /// Participants left waiting because their partition ran short
    pub leftover: Vec<ParticipantId>,
}

/// Plan the groups for one pool snapshot.
///
/// `match_size` must be at least 2 (checked by engine config validation).
pub fn form_groups(pool: Vec<Participant>, match_size: usize) -> PairingPlan {
    let mut plan = PairingPlan::default();
    if match_size < 2 {
        plan.leftover = pool.into_iter().map(|p| p.participant_id).collect();
        return plan;
    }

    for part in partition(pool) {
        let mut chunks = part.entries.chunks_exact(match_size);
        for chunk in chunks.by_ref() {
            plan.groups.push(Group {
                attributes: part.attributes.clone(),
                members: chunk.iter().map(|p| p.participant_id.clone()).collect(),
                oldest_enqueued_at: chunk[0].enqueued_at,
            });
        }
        plan.leftover
            .extend(chunks.remainder().iter().map(|p| p.participant_id.clone()));
    }

    plan.groups.sort_by(|a, b| {
        (a.oldest_enqueued_at, &a.members).cmp(&(b.oldest_enqueued_at, &b.members))
    });
    plan
}
