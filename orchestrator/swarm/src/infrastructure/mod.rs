// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// In-memory connection store. Upserts replace the stored edge with the same
// (source, target, type) key, including reviving it if it had gone stale.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use colony_core::domain::repository::RepositoryError;
use parking_lot::RwLock;

use crate::domain::connection::{AgentConnection, ConnectionKey, ConnectionRepository};

#[derive(Clone, Default)]
pub struct InMemoryConnectionRepository {
    connections: Arc<RwLock<BTreeMap<ConnectionKey, AgentConnection>>>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<AgentConnection> {
        self.connections.read().values().cloned().collect()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn upsert(&self, connection: &AgentConnection) -> Result<(), RepositoryError> {
        self.connections.write().insert(connection.key(), connection.clone());
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<AgentConnection>, RepositoryError> {
        Ok(self
            .connections
            .read()
            .values()
            .filter(|c| c.active)
            .cloned()
            .collect())
    }

    async fn deactivate_except(&self, current: &[ConnectionKey]) -> Result<usize, RepositoryError> {
        let keep: BTreeSet<&ConnectionKey> = current.iter().collect();
        let mut connections = self.connections.write();
        let mut changed = 0;
        for (key, connection) in connections.iter_mut() {
            if connection.active && !keep.contains(key) {
                connection.active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::ConnectionType;
    use chrono::{DateTime, Duration, Utc};
    use colony_core::domain::agent::AgentId;

    fn connection(kind: ConnectionType, strength: f64, at: DateTime<Utc>) -> AgentConnection {
        AgentConnection::new(AgentId::from("a"), AgentId::from("b"), kind, strength, at)
    }

    #[tokio::test]
    async fn test_upsert_is_keyed_by_source_target_type() {
        let repo = InMemoryConnectionRepository::new();
        let now = Utc::now();

        repo.upsert(&connection(ConnectionType::DelegatesTo, 0.3, now)).await.unwrap();
        repo.upsert(&connection(ConnectionType::DelegatesTo, 0.6, now)).await.unwrap();
        repo.upsert(&connection(ConnectionType::CoordinatesWith, 0.4, now)).await.unwrap();

        let all = repo.all();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|c| c.connection_type == ConnectionType::DelegatesTo && c.strength == 0.6));
    }

    #[tokio::test]
    async fn test_deactivate_except_keeps_only_current_keys() {
        let repo = InMemoryConnectionRepository::new();
        let now = Utc::now();

        let old = connection(ConnectionType::DelegatesTo, 0.5, now - Duration::hours(48));
        let fresh = connection(ConnectionType::FeedsDataTo, 0.5, now);
        repo.upsert(&old).await.unwrap();
        repo.upsert(&fresh).await.unwrap();

        assert_eq!(repo.deactivate_except(&[fresh.key()]).await.unwrap(), 1);
        assert_eq!(repo.deactivate_except(&[fresh.key()]).await.unwrap(), 0);

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].connection_type, ConnectionType::FeedsDataTo);
        assert_eq!(repo.all().len(), 2);
    }

    #[tokio::test]
    async fn test_deactivate_except_recent_edge_of_another_type() {
        let repo = InMemoryConnectionRepository::new();
        let now = Utc::now();

        // Same pair, reclassified: the superseded edge is retired even though
        // its last interaction is recent.
        let before = connection(ConnectionType::DelegatesTo, 0.5, now);
        let after = connection(ConnectionType::CoordinatesWith, 0.4, now);
        repo.upsert(&before).await.unwrap();
        repo.upsert(&after).await.unwrap();

        assert_eq!(repo.deactivate_except(&[after.key()]).await.unwrap(), 1);
        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].connection_type, ConnectionType::CoordinatesWith);

        assert_eq!(repo.deactivate_except(&[]).await.unwrap(), 1);
        assert!(repo.list_active().await.unwrap().is_empty());
    }
}
