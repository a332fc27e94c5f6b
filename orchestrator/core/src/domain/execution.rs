// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Failed,
}

/// Outcome of one `run`, written after the strategy returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: ExecutionId,
    pub agent_id: AgentId,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Tool names invoked during the run, in first-use order
    pub tools_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn completed(
        agent_id: AgentId,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        tools_used: Vec<String>,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            agent_id,
            status: ExecutionStatus::Completed,
            started_at,
            ended_at,
            tools_used,
            error: None,
        }
    }

    pub fn failed(
        agent_id: AgentId,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        tools_used: Vec<String>,
        error: String,
    ) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            error: Some(error),
            ..Self::completed(agent_id, started_at, ended_at, tools_used)
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }
}
