//! Connection registry: participant -> live connection.
//!
//! Written from many transport sessions at once. DashMap shards the
//! bindings, so sessions for different participants do not contend.
//! A reverse index lets a closing connection find its bindings without
//! scanning the whole map.

use dashmap::DashMap;
use tracing::debug;
use types::ids::{ConnectionId, ParticipantId};

#[derive(Default)]
pub struct ConnectionRegistry {
    bindings: DashMap<ParticipantId, ConnectionId>,
    by_connection: DashMap<ConnectionId, Vec<ParticipantId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `participant` to `connection`, superseding any earlier binding.
    pub fn register(&self, participant: ParticipantId, connection: ConnectionId) {
        let previous = self.bindings.insert(participant.clone(), connection);
        if previous == Some(connection) {
            return;
        }

        {
            let mut owned = self.by_connection.entry(connection).or_default();
            if !owned.contains(&participant) {
                owned.push(participant.clone());
            }
        }

        // A racing register for the same participant may have won between
        // the two map updates; its cleanup could not see our reverse entry.
        if self.lookup(&participant) != Some(connection) {
            self.unlink(connection, &participant);
        }

        if let Some(old) = previous {
            self.unlink(old, &participant);
            debug!(
                participant_id = %participant,
                old_connection = %old,
                new_connection = %connection,
                "Binding superseded"
            );
        }
    }

    /// Remove every binding that still points at `connection`.
    ///
    /// Bindings already superseded by a newer registration are left alone.
    /// Returns the participants that were unbound.
    pub fn deregister(&self, connection: ConnectionId) -> Vec<ParticipantId> {
        let Some((_, owned)) = self.by_connection.remove(&connection) else {
            return Vec::new();
        };

        owned
            .into_iter()
            .filter(|participant| {
                self.bindings
                    .remove_if(participant, |_, bound| *bound == connection)
                    .is_some()
            })
            .collect()
    }

    /// Drop `participant` from the reverse index of `connection`.
    fn unlink(&self, connection: ConnectionId, participant: &ParticipantId) {
        if let Some(mut owned) = self.by_connection.get_mut(&connection) {
            owned.retain(|p| p != participant);
        }
        self.by_connection.remove_if(&connection, |_, owned| owned.is_empty());
    }

    /// Current connection for `participant`, if any.
    pub fn lookup(&self, participant: &ParticipantId) -> Option<ConnectionId> {
        self.bindings.get(participant).map(|entry| *entry.value())
    }

    /// Number of bound participants
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    #[test]
    fn test_lookup_unregistered_is_absent() {
        let reg = ConnectionRegistry::new();
        assert_eq!(reg.lookup(&pid("nobody")), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_register_and_lookup() {
        let reg = ConnectionRegistry::new();
        let conn = ConnectionId::new();
        reg.register(pid("a"), conn);

        assert_eq!(reg.lookup(&pid("a")), Some(conn));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_register_is_idempotent() {
        let reg = ConnectionRegistry::new();
        let conn = ConnectionId::new();
        reg.register(pid("a"), conn);
        reg.register(pid("a"), conn);

        assert_eq!(reg.lookup(&pid("a")), Some(conn));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.deregister(conn), vec![pid("a")]);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_later_registration_supersedes() {
        let reg = ConnectionRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        reg.register(pid("a"), first);
        reg.register(pid("a"), second);

        assert_eq!(reg.lookup(&pid("a")), Some(second));
    }

    #[test]
    fn test_stale_deregister_keeps_newer_binding() {
        let reg = ConnectionRegistry::new();
        let old = ConnectionId::new();
        let new = ConnectionId::new();

        reg.register(pid("a"), old);
        reg.register(pid("a"), new);

        let removed = reg.deregister(old);
        assert!(removed.is_empty());
        assert_eq!(reg.lookup(&pid("a")), Some(new));
    }

    #[test]
    fn test_deregister_unknown_connection_is_noop() {
        let reg = ConnectionRegistry::new();
        reg.register(pid("a"), ConnectionId::new());

        assert!(reg.deregister(ConnectionId::new()).is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_deregister_only_touches_its_own_bindings() {
        let reg = ConnectionRegistry::new();
        let c1 = ConnectionId::new();
        let c2 = ConnectionId::new();
        reg.register(pid("a"), c1);
        reg.register(pid("b"), c2);

        assert_eq!(reg.deregister(c1), vec![pid("a")]);
        assert_eq!(reg.lookup(&pid("a")), None);
        assert_eq!(reg.lookup(&pid("b")), Some(c2));
    }

    #[test]
    fn test_concurrent_registration_across_participants() {
        let reg = Arc::new(ConnectionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for i in 0..250 {
                        let participant = pid(&format!("t{}-p{}", t, i));
                        let conn = ConnectionId::new();
                        reg.register(participant.clone(), conn);
                        assert_eq!(reg.lookup(&participant), Some(conn));
                        if i % 2 == 0 {
                            assert_eq!(reg.deregister(conn), vec![participant]);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(reg.len(), 8 * 125);
    }

    #[test]
    fn test_racing_registrations_leave_one_reverse_entry() {
        for _ in 0..50 {
            let reg = Arc::new(ConnectionRegistry::new());
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let reg = Arc::clone(&reg);
                    thread::spawn(move || {
                        for _ in 0..20 {
                            reg.register(pid("contended"), ConnectionId::new());
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let bound = reg.lookup(&pid("contended")).unwrap();
            assert_eq!(reg.by_connection.len(), 1);
            assert_eq!(
                reg.by_connection.get(&bound).map(|owned| owned.value().clone()),
                Some(vec![pid("contended")])
            );
            assert_eq!(reg.deregister(bound), vec![pid("contended")]);
            assert!(reg.by_connection.is_empty());
        }
    }
}
