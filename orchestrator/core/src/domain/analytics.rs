// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Per-agent performance summaries consumed by swarm scoring.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentId;
use crate::domain::repository::RepositoryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub agent_id: AgentId,
    /// Percentage of successful executions, 0–100
    pub success_rate: f64,
    pub avg_execution_time_ms: f64,
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
}

#[async_trait]
pub trait PerformanceAnalytics: Send + Sync {
    /// `Ok(None)` when the agent has no recorded executions.
    async fn performance(&self, agent_id: &AgentId) -> Result<Option<PerformanceSummary>, RepositoryError>;
}
