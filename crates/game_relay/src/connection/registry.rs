//! Registry of open connections and their player IDs.
//!
//! The registry is the only state shared between connection tasks. It is an
//! explicitly constructed value owned by the server and handed out as an
//! `Arc`, so tests can build as many isolated instances as they like.

use super::client::ClientConnection;
use crate::types::{ConnectionId, PlayerId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// A registered connection paired with the player ID it was given.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub connection: Arc<ClientConnection>,
    pub player_id: PlayerId,
}

/// Concurrency-safe mapping of open connections to player IDs.
///
/// Every operation is a total function over the current membership.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: DashMap<ConnectionId, RegistryEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Registers a freshly accepted connection and returns its new player ID.
    ///
    /// A connection is only ever given one ID; registering it again returns
    /// the ID it already holds.
    pub fn register(&self, connection: Arc<ClientConnection>) -> PlayerId {
        match self.entries.entry(connection.id()) {
            Entry::Occupied(existing) => existing.get().player_id,
            Entry::Vacant(slot) => {
                let player_id = PlayerId::new();
                slot.insert(RegistryEntry {
                    connection,
                    player_id,
                });
                player_id
            }
        }
    }

    /// Removes a connection, returning the player ID it held.
    ///
    /// Returns `None` when the connection is not (or no longer) registered,
    /// which makes teardown safe to run more than once.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<PlayerId> {
        self.entries
            .remove(&connection_id)
            .map(|(_, entry)| entry.player_id)
    }

    /// Point-in-time copy of the membership, safe to iterate while other
    /// tasks register and unregister.
    pub fn snapshot(&self) -> Vec<RegistryEntry> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Looks up the player ID of an open connection.
    pub fn player_id(&self, connection_id: ConnectionId) -> Option<PlayerId> {
        self.entries
            .get(&connection_id)
            .map(|entry| entry.player_id)
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.entries.contains_key(&connection_id)
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn connection() -> Arc<ClientConnection> {
        let (conn, _rx) = ClientConnection::with_queue("127.0.0.1:50000".parse().unwrap(), 8);
        Arc::new(conn)
    }

    #[test]
    fn register_assigns_player_id() {
        let registry = ConnectionRegistry::new();
        let conn = connection();
        let id = registry.register(conn.clone());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.player_id(conn.id()), Some(id));
    }

    #[test]
    fn register_twice_keeps_first_id() {
        let registry = ConnectionRegistry::new();
        let conn = connection();
        let first = registry.register(conn.clone());
        let second = registry.register(conn);

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let conn = connection();
        let id = registry.register(conn.clone());

        assert_eq!(registry.unregister(conn.id()), Some(id));
        assert_eq!(registry.unregister(conn.id()), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_unknown_connection_is_none() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.unregister(424242), None);
    }

    #[test]
    fn snapshot_reflects_membership() {
        let registry = ConnectionRegistry::new();
        let a = connection();
        let b = connection();
        let id_a = registry.register(a.clone());
        let id_b = registry.register(b.clone());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        let ids: HashSet<PlayerId> = snapshot.iter().map(|e| e.player_id).collect();
        assert!(ids.contains(&id_a) && ids.contains(&id_b));

        registry.unregister(a.id());
        let after = registry.snapshot();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].connection.id(), b.id());
        // The earlier copy is unaffected.
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_get_distinct_ids() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();

        for _ in 0..64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                (0..16)
                    .map(|_| registry.register(connection()))
                    .collect::<Vec<_>>()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(ids.insert(id), "duplicate player id {id}");
            }
        }

        assert_eq!(ids.len(), 64 * 16);
        assert_eq!(registry.len(), 64 * 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn snapshots_never_tear_under_churn() {
        let registry = Arc::new(ConnectionRegistry::new());

        let churn = {
            let registry = registry.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    let conn = connection();
                    registry.register(conn.clone());
                    tokio::task::yield_now().await;
                    registry.unregister(conn.id());
                }
            })
        };

        for _ in 0..500 {
            let snapshot = registry.snapshot();
            let unique: HashSet<_> = snapshot.iter().map(|e| e.connection.id()).collect();
            assert_eq!(unique.len(), snapshot.len());
            tokio::task::yield_now().await;
        }

        churn.await.unwrap();
        assert!(registry.is_empty());
    }
}
