// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts consumed by the runtime and by swarm analysis. The
//! interfaces live in the domain layer; implementations live in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Record | Implementations |
//! |-------|--------|----------------|
//! | `ExecutionRepository` | `ExecutionRecord` | `InMemoryExecutionRepository` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::agent::AgentId;
use crate::domain::execution::ExecutionRecord;

/// Execution-log store: one record per finished `run`.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Append an execution record
    async fn save(&self, record: &ExecutionRecord) -> Result<(), RepositoryError>;

    /// All records for one agent, oldest first
    async fn find_by_agent(&self, agent_id: &AgentId) -> Result<Vec<ExecutionRecord>, RepositoryError>;

    /// Completed records whose start lies at or after `since`, oldest first
    async fn find_completed_since(&self, since: DateTime<Utc>) -> Result<Vec<ExecutionRecord>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
