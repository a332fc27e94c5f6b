// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::agent::AgentId;
use crate::domain::analytics::{PerformanceAnalytics, PerformanceSummary};
use crate::domain::repository::{ExecutionRepository, RepositoryError};

/// Derives performance summaries from the execution log.
pub struct ExecutionPerformanceAnalytics {
    executions: Arc<dyn ExecutionRepository>,
}

impl ExecutionPerformanceAnalytics {
    pub fn new(executions: Arc<dyn ExecutionRepository>) -> Self {
        Self { executions }
    }
}

#[async_trait]
impl PerformanceAnalytics for ExecutionPerformanceAnalytics {
    async fn performance(&self, agent_id: &AgentId) -> Result<Option<PerformanceSummary>, RepositoryError> {
        let records = self.executions.find_by_agent(agent_id).await?;
        if records.is_empty() {
            return Ok(None);
        }

        let total = records.len() as u64;
        let successful = records.iter().filter(|r| r.is_completed()).count() as u64;
        let total_ms: i64 = records.iter().map(|r| r.duration_ms()).sum();

        Ok(Some(PerformanceSummary {
            agent_id: agent_id.clone(),
            success_rate: successful as f64 / total as f64 * 100.0,
            avg_execution_time_ms: total_ms as f64 / total as f64,
            total_executions: total,
            successful_executions: successful,
            failed_executions: total - successful,
        }))
    }
}
