// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository abstractions defined in
//! the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve execution records
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! ## In-Memory Repositories
//!
//! - **InMemoryExecutionRepository** - Thread-safe, append-only execution log
//!
//! A relational store is an external collaborator; anything implementing
//! `ExecutionRepository` can be injected in place of the in-memory log.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::agent::AgentId;
use crate::domain::execution::ExecutionRecord;
use crate::domain::repository::{ExecutionRepository, RepositoryError};

#[derive(Clone, Default)]
pub struct InMemoryExecutionRepository {
    records: Arc<RwLock<Vec<ExecutionRecord>>>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn save(&self, record: &ExecutionRecord) -> Result<(), RepositoryError> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn find_by_agent(&self, agent_id: &AgentId) -> Result<Vec<ExecutionRecord>, RepositoryError> {
        let records = self.records.read();
        let mut found: Vec<_> = records.iter().filter(|r| &r.agent_id == agent_id).cloned().collect();
        found.sort_by_key(|r| r.started_at);
        Ok(found)
    }

    async fn find_completed_since(&self, since: DateTime<Utc>) -> Result<Vec<ExecutionRecord>, RepositoryError> {
        // Clone under the read lock: callers work on a point-in-time snapshot
        let records = self.records.read();
        let mut found: Vec<_> = records
            .iter()
            .filter(|r| r.is_completed() && r.started_at >= since)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.started_at);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_find_completed_since_filters_window_and_status() {
        let repo = InMemoryExecutionRepository::new();
        let now = Utc::now();
        let a = AgentId::from("a");

        let old = ExecutionRecord::completed(a.clone(), now - Duration::hours(30), now - Duration::hours(29), vec![]);
        let recent = ExecutionRecord::completed(a.clone(), now - Duration::hours(1), now, vec!["ping".into()]);
        let failed = ExecutionRecord::failed(a.clone(), now - Duration::minutes(5), now, vec![], "boom".into());

        for r in [&old, &recent, &failed] {
            repo.save(r).await.unwrap();
        }

        let found = repo.find_completed_since(now - Duration::hours(24)).await.unwrap();
        assert_eq!(found, vec![recent]);

        assert_eq!(repo.find_by_agent(&a).await.unwrap().len(), 3);
        assert!(repo.find_by_agent(&AgentId::from("b")).await.unwrap().is_empty());
    }
}
