//! In-memory match store
//!
//! One mutex guards the whole pool, which serializes enqueue, cancel and
//! pairing commits against each other.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use types::errors::StoreError;
use types::ids::{MatchId, ParticipantId};
use types::match_record::{Match, MatchStatus};
use types::now_nanos;
use types::participant::{MatchAttributes, Participant, ParticipantStatus};

use super::{MatchStore, TransitionOutcome, WaitingFilter};

#[derive(Default)]
struct PoolState {
    participants: HashMap<ParticipantId, Participant>,
    matches: HashMap<MatchId, Match>,
}

impl PoolState {
    fn get(&self, id: &ParticipantId) -> Result<&Participant, StoreError> {
        self.participants
            .get(id)
            .ok_or_else(|| StoreError::ParticipantNotFound {
                participant_id: id.to_string(),
            })
    }

    /// A Matched participant still holds a slot while its match is active
    fn holds_active_match(&self, participant: &Participant) -> bool {
        participant.status == ParticipantStatus::Matched
            && participant
                .match_id
                .and_then(|id| self.matches.get(&id))
                .map_or(true, |m| m.status.is_active())
    }
}

#[derive(Default)]
pub struct InMemoryMatchStore {
    state: Mutex<PoolState>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of participants currently waiting
    pub fn waiting_count(&self) -> usize {
        self.state
            .lock()
            .participants
            .values()
            .filter(|p| p.is_waiting())
            .count()
    }

    /// Every match record, oldest first
    pub fn matches(&self) -> Vec<Match> {
        let mut matches: Vec<Match> = self.state.lock().matches.values().cloned().collect();
        matches.sort_by_key(|m| (m.created_at, m.match_id));
        matches
    }
}

fn ensure_distinct(members: &[ParticipantId]) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(members.len());
    if members.iter().all(|m| seen.insert(m)) {
        Ok(())
    } else {
        Err(StoreError::InvalidGroup {
            reason: "duplicate member".to_string(),
        })
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn fetch_waiting(&self, filter: &WaitingFilter) -> Result<Vec<Participant>, StoreError> {
        let state = self.state.lock();
        let mut waiting: Vec<Participant> = state
            .participants
            .values()
            .filter(|p| p.is_waiting() && filter.accepts(p))
            .cloned()
            .collect();
        waiting.sort_by(|a, b| a.arrival_key().cmp(&b.arrival_key()));
        Ok(waiting)
    }

    async fn transition_to_matched(
        &self,
        members: &[ParticipantId],
    ) -> Result<TransitionOutcome, StoreError> {
        ensure_distinct(members)?;
        let mut state = self.state.lock();

        let ineligible: Vec<ParticipantId> = members
            .iter()
            .filter(|id| !state.participants.get(*id).is_some_and(Participant::is_waiting))
            .cloned()
            .collect();
        if !ineligible.is_empty() {
            return Ok(TransitionOutcome::Conflict { ineligible });
        }

        let now = now_nanos();
        for id in members {
            if let Some(p) = state.participants.get_mut(id) {
                p.status = ParticipantStatus::Matched;
                p.match_id = None;
                p.updated_at = now;
            }
        }
        Ok(TransitionOutcome::Committed)
    }

    async fn create_match(&self, members: &[ParticipantId]) -> Result<Match, StoreError> {
        if members.len() < 2 {
            return Err(StoreError::InvalidGroup {
                reason: format!("match needs at least 2 members, got {}", members.len()),
            });
        }
        ensure_distinct(members)?;
        let mut state = self.state.lock();

        for id in members {
            let p = state.get(id)?;
            if p.status != ParticipantStatus::Matched || p.match_id.is_some() {
                return Err(StoreError::InvalidGroup {
                    reason: format!("{} is not pending a match record", id),
                });
            }
        }

        let now = now_nanos();
        let record = Match::new(members.to_vec(), now);
        for id in members {
            if let Some(p) = state.participants.get_mut(id) {
                p.match_id = Some(record.match_id);
                p.updated_at = now;
            }
        }
        state.matches.insert(record.match_id, record.clone());
        debug!(match_id = %record.match_id, size = members.len(), "Match record created");
        Ok(record)
    }

    async fn release_to_waiting(&self, members: &[ParticipantId]) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let now = now_nanos();
        for id in members {
            if let Some(p) = state.participants.get_mut(id) {
                if p.status == ParticipantStatus::Matched && p.match_id.is_none() {
                    p.status = ParticipantStatus::Waiting;
                    p.updated_at = now;
                }
            }
        }
        Ok(())
    }

    async fn mark_cancelled(&self, participant: &ParticipantId) -> Result<Participant, StoreError> {
        let mut state = self.state.lock();
        let current = state.get(participant)?.status;
        if current != ParticipantStatus::Waiting {
            return Err(StoreError::InvalidTransition {
                from: current.as_str().to_string(),
                to: ParticipantStatus::Cancelled.as_str().to_string(),
            });
        }

        let p = state
            .participants
            .get_mut(participant)
            .ok_or_else(|| StoreError::ParticipantNotFound {
                participant_id: participant.to_string(),
            })?;
        p.status = ParticipantStatus::Cancelled;
        p.updated_at = now_nanos();
        Ok(p.clone())
    }

    async fn enqueue(
        &self,
        participant: ParticipantId,
        attributes: MatchAttributes,
        timestamp: i64,
    ) -> Result<Participant, StoreError> {
        let mut state = self.state.lock();
        if let Some(existing) = state.participants.get(&participant) {
            if !existing.status.is_terminal() {
                return Err(StoreError::AlreadyWaiting {
                    participant_id: participant.to_string(),
                });
            }
            if state.holds_active_match(existing) {
                return Err(StoreError::InvalidTransition {
                    from: ParticipantStatus::Matched.as_str().to_string(),
                    to: ParticipantStatus::Waiting.as_str().to_string(),
                });
            }
        }

        let entry = Participant::new(participant.clone(), attributes, timestamp);
        state.participants.insert(participant, entry.clone());
        Ok(entry)
    }

    async fn participant(&self, participant: &ParticipantId) -> Result<Participant, StoreError> {
        self.state.lock().get(participant).cloned()
    }

    async fn get_match(&self, match_id: &MatchId) -> Result<Match, StoreError> {
        self.state
            .lock()
            .matches
            .get(match_id)
            .cloned()
            .ok_or_else(|| StoreError::MatchNotFound {
                match_id: match_id.to_string(),
            })
    }

    async fn set_match_status(
        &self,
        match_id: &MatchId,
        status: MatchStatus,
    ) -> Result<Match, StoreError> {
        let mut state = self.state.lock();
        let record = state
            .matches
            .get_mut(match_id)
            .ok_or_else(|| StoreError::MatchNotFound {
                match_id: match_id.to_string(),
            })?;

        if !record.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: record.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }
        record.status = status;
        record.updated_at = now_nanos();
        Ok(record.clone())
    }

    async fn expire_proposed(&self, created_before: i64) -> Result<Vec<Match>, StoreError> {
        let mut state = self.state.lock();
        let now = now_nanos();
        let mut expired: Vec<Match> = state
            .matches
            .values_mut()
            .filter(|m| m.status == MatchStatus::Proposed && m.created_at < created_before)
            .map(|m| {
                m.status = MatchStatus::Expired;
                m.updated_at = now;
                m.clone()
            })
            .collect();
        expired.sort_by_key(|m| (m.created_at, m.match_id));
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    async fn store_with(ids: &[&str]) -> InMemoryMatchStore {
        let store = InMemoryMatchStore::new();
        for (i, id) in ids.iter().enumerate() {
            store
                .enqueue(pid(id), MatchAttributes::default(), 1000 + i as i64)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_fetch_waiting_oldest_first() {
        let store = InMemoryMatchStore::new();
        store.enqueue(pid("late"), MatchAttributes::default(), 30).await.unwrap();
        store.enqueue(pid("early"), MatchAttributes::default(), 10).await.unwrap();

        let waiting = store.fetch_waiting(&WaitingFilter::all()).await.unwrap();
        let ids: Vec<_> = waiting.iter().map(|p| p.participant_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_fetch_waiting_with_filter() {
        let store = InMemoryMatchStore::new();
        store
            .enqueue(pid("a"), MatchAttributes::with_category("ranked"), 1)
            .await
            .unwrap();
        store.enqueue(pid("b"), MatchAttributes::default(), 2).await.unwrap();

        let filter = WaitingFilter::with_attributes(MatchAttributes::with_category("ranked"));
        let waiting = store.fetch_waiting(&filter).await.unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].participant_id, pid("a"));
    }

    #[tokio::test]
    async fn test_duplicate_enqueue_rejected() {
        let store = store_with(&["a"]).await;
        let err = store
            .enqueue(pid("a"), MatchAttributes::default(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyWaiting { .. }));
    }

    #[tokio::test]
    async fn test_transition_and_create_match() {
        let store = store_with(&["a", "b"]).await;
        let members = vec![pid("a"), pid("b")];

        let outcome = store.transition_to_matched(&members).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Committed);

        let record = store.create_match(&members).await.unwrap();
        assert_eq!(record.members, members);
        assert_eq!(record.status, MatchStatus::Proposed);

        let a = store.participant(&pid("a")).await.unwrap();
        assert_eq!(a.status, ParticipantStatus::Matched);
        assert_eq!(a.match_id, Some(record.match_id));
        assert_eq!(store.waiting_count(), 0);
    }

    #[tokio::test]
    async fn test_transition_conflict_changes_nothing() {
        let store = store_with(&["a", "b"]).await;
        store.mark_cancelled(&pid("b")).await.unwrap();

        let outcome = store
            .transition_to_matched(&[pid("a"), pid("b")])
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Conflict {
                ineligible: vec![pid("b")]
            }
        );

        let a = store.participant(&pid("a")).await.unwrap();
        assert!(a.is_waiting(), "other members must stay waiting");
    }

    #[tokio::test]
    async fn test_unknown_member_is_a_conflict() {
        let store = store_with(&["a"]).await;
        let outcome = store
            .transition_to_matched(&[pid("a"), pid("ghost")])
            .await
            .unwrap();
        assert!(matches!(outcome, TransitionOutcome::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_members_rejected() {
        let store = store_with(&["a"]).await;
        let err = store
            .transition_to_matched(&[pid("a"), pid("a")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidGroup { .. }));
    }

    #[tokio::test]
    async fn test_create_match_requires_transition() {
        let store = store_with(&["a", "b"]).await;
        let err = store.create_match(&[pid("a"), pid("b")]).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidGroup { .. }));
    }

    #[tokio::test]
    async fn test_release_to_waiting() {
        let store = store_with(&["a", "b"]).await;
        let members = vec![pid("a"), pid("b")];
        store.transition_to_matched(&members).await.unwrap();

        store.release_to_waiting(&members).await.unwrap();
        assert_eq!(store.waiting_count(), 2);
    }

    #[tokio::test]
    async fn test_cancel_terminal_rejected() {
        let store = store_with(&["a"]).await;
        store.mark_cancelled(&pid("a")).await.unwrap();

        let err = store.mark_cancelled(&pid("a")).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidTransition {
                from: "CANCELLED".to_string(),
                to: "CANCELLED".to_string(),
            }
        );
        assert!(matches!(
            store.mark_cancelled(&pid("ghost")).await,
            Err(StoreError::ParticipantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reenqueue_after_cancel() {
        let store = store_with(&["a"]).await;
        store.mark_cancelled(&pid("a")).await.unwrap();

        let entry = store
            .enqueue(pid("a"), MatchAttributes::default(), 99)
            .await
            .unwrap();
        assert!(entry.is_waiting());
        assert_eq!(entry.enqueued_at, 99);
    }

    #[tokio::test]
    async fn test_reenqueue_blocked_while_match_active() {
        let store = store_with(&["a", "b"]).await;
        let members = vec![pid("a"), pid("b")];
        store.transition_to_matched(&members).await.unwrap();
        let record = store.create_match(&members).await.unwrap();

        assert!(matches!(
            store.enqueue(pid("a"), MatchAttributes::default(), 50).await,
            Err(StoreError::InvalidTransition { .. })
        ));

        store
            .set_match_status(&record.match_id, MatchStatus::Expired)
            .await
            .unwrap();
        assert!(store
            .enqueue(pid("a"), MatchAttributes::default(), 51)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_match_status_transitions() {
        let store = store_with(&["a", "b"]).await;
        let members = vec![pid("a"), pid("b")];
        store.transition_to_matched(&members).await.unwrap();
        let record = store.create_match(&members).await.unwrap();

        let confirmed = store
            .set_match_status(&record.match_id, MatchStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, MatchStatus::Confirmed);

        let err = store
            .set_match_status(&record.match_id, MatchStatus::Proposed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        assert!(matches!(
            store.get_match(&MatchId::new()).await,
            Err(StoreError::MatchNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_expire_proposed_frees_members() {
        let store = store_with(&["a", "b", "c", "d"]).await;
        let first = vec![pid("a"), pid("b")];
        let second = vec![pid("c"), pid("d")];
        store.transition_to_matched(&first).await.unwrap();
        let proposed = store.create_match(&first).await.unwrap();
        store.transition_to_matched(&second).await.unwrap();
        let confirmed = store.create_match(&second).await.unwrap();
        store
            .set_match_status(&confirmed.match_id, MatchStatus::Confirmed)
            .await
            .unwrap();

        assert!(store.expire_proposed(0).await.unwrap().is_empty());

        let expired = store.expire_proposed(i64::MAX).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].match_id, proposed.match_id);
        assert_eq!(expired[0].status, MatchStatus::Expired);

        let untouched = store.get_match(&confirmed.match_id).await.unwrap();
        assert_eq!(untouched.status, MatchStatus::Confirmed);

        store.enqueue(pid("a"), MatchAttributes::default(), 60).await.unwrap();
        assert!(matches!(
            store.enqueue(pid("c"), MatchAttributes::default(), 61).await,
            Err(StoreError::InvalidTransition { .. })
        ));
    }
}
