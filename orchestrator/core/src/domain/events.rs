// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentId, AgentState};
use crate::domain::execution::ExecutionId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentLifecycleEvent {
    AgentCreated {
        agent_id: AgentId,
        name: String,
        created_at: DateTime<Utc>,
    },
    AgentInitialized {
        agent_id: AgentId,
        initialized_at: DateTime<Utc>,
    },
    AgentStateChanged {
        agent_id: AgentId,
        from: AgentState,
        to: AgentState,
        changed_at: DateTime<Utc>,
    },
    AgentRunCompleted {
        agent_id: AgentId,
        execution_id: ExecutionId,
        duration_ms: i64,
        completed_at: DateTime<Utc>,
    },
    AgentRunFailed {
        agent_id: AgentId,
        execution_id: ExecutionId,
        reason: String,
        failed_at: DateTime<Utc>,
    },
    AgentDeleted {
        agent_id: AgentId,
        deleted_at: DateTime<Utc>,
    },
}

impl AgentLifecycleEvent {
    pub fn agent_id(&self) -> &AgentId {
        match self {
            AgentLifecycleEvent::AgentCreated { agent_id, .. }
            | AgentLifecycleEvent::AgentInitialized { agent_id, .. }
            | AgentLifecycleEvent::AgentStateChanged { agent_id, .. }
            | AgentLifecycleEvent::AgentRunCompleted { agent_id, .. }
            | AgentLifecycleEvent::AgentRunFailed { agent_id, .. }
            | AgentLifecycleEvent::AgentDeleted { agent_id, .. } => agent_id,
        }
    }
}
