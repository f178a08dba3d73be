//! Compatibility partitioning
//!
//! Participants may only share a match with participants whose matching
//! attributes are equal. Each partition keeps arrival order.

use std::collections::{BTreeMap, HashSet};

use types::participant::{MatchAttributes, Participant};

/// Waiting participants sharing one attribute set, oldest first
#[derive(Debug, Clone)]
pub struct Partition {
    pub attributes: MatchAttributes,
    pub entries: Vec<Participant>,
}

/// Split a pool snapshot into compatibility partitions.
///
/// Non-waiting entries and repeated ids are dropped, so a stale or
/// duplicated snapshot can never put one participant in two groups.
/// Partitions come back in attribute order (BTreeMap for deterministic
/// iteration).
pub fn partition(mut pool: Vec<Participant>) -> Vec<Partition> {
    pool.sort_by(|a, b| a.arrival_key().cmp(&b.arrival_key()));

    let mut seen = HashSet::new();
    let mut partitions: BTreeMap<MatchAttributes, Vec<Participant>> = BTreeMap::new();

    for participant in pool {
        if !participant.is_waiting() || !seen.insert(participant.participant_id.clone()) {
            continue;
        }
        partitions
            .entry(participant.attributes.clone())
            .or_default()
            .push(participant);
    }

    partitions
        .into_iter()
        .map(|(attributes, entries)| Partition {
            attributes,
            entries,
        })
        .collect()
}
