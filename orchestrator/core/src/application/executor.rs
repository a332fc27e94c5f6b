// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Executor
//!
//! Runs an agent's strategy once against its context and records the outcome.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Purpose:** Single entry point for every run, whatever triggered it
//! - **Collaborators:** `ExecutionRepository`, `EventBus`
//!
//! A run never fails from the caller's point of view: strategy errors and
//! panics are appended to the context log as `ERROR: ...` lines and the run
//! is recorded as failed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::domain::agent::Agent;
use crate::domain::context::ContextSnapshot;
use crate::domain::events::AgentLifecycleEvent;
use crate::domain::execution::ExecutionRecord;
use crate::domain::repository::ExecutionRepository;
use crate::infrastructure::event_bus::EventBus;

#[derive(Clone)]
pub struct AgentExecutor {
    executions: Arc<dyn ExecutionRepository>,
    event_bus: EventBus,
}

impl AgentExecutor {
    pub fn new(executions: Arc<dyn ExecutionRepository>, event_bus: EventBus) -> Self {
        Self {
            executions,
            event_bus,
        }
    }

    pub fn executions(&self) -> Arc<dyn ExecutionRepository> {
        self.executions.clone()
    }

    /// Invoke the agent's strategy with `input` and return the resulting
    /// context. Runs on the same agent are serialized by the context lock.
    pub async fn execute(&self, agent: &Agent, input: Value) -> ContextSnapshot {
        let mut context = agent.context().lock().await;
        context.begin_run();
        let started_at = Utc::now();

        debug!(agent_id = %agent.id(), strategy = agent.strategy().name(), "Starting run");

        let outcome = AssertUnwindSafe(agent.strategy().run(&mut *context, input))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(panic) => Some(panic_message(panic.as_ref())),
        };

        if let Some(reason) = &failure {
            context.log(format!("ERROR: {}", reason));
        }

        let ended_at = Utc::now();
        let tools_used = context.take_tools_used();
        let snapshot = context.snapshot();
        drop(context);

        let record = match failure {
            None => ExecutionRecord::completed(agent.id().clone(), started_at, ended_at, tools_used),
            Some(reason) => ExecutionRecord::failed(agent.id().clone(), started_at, ended_at, tools_used, reason),
        };

        if let Err(e) = self.executions.save(&record).await {
            warn!(agent_id = %agent.id(), "Failed to persist execution record: {}", e);
        }

        let outcome = if record.is_completed() { "completed" } else { "failed" };
        metrics::counter!("colony_agent_runs_total", "outcome" => outcome).increment(1);

        match &record.error {
            None => {
                info!(agent_id = %agent.id(), duration_ms = record.duration_ms(), "Run completed");
                self.event_bus.publish(AgentLifecycleEvent::AgentRunCompleted {
                    agent_id: agent.id().clone(),
                    execution_id: record.id,
                    duration_ms: record.duration_ms(),
                    completed_at: ended_at,
                });
            }
            Some(reason) => {
                error!(agent_id = %agent.id(), "Run failed: {}", reason);
                self.event_bus.publish(AgentLifecycleEvent::AgentRunFailed {
                    agent_id: agent.id().clone(),
                    execution_id: record.id,
                    reason: reason.clone(),
                    failed_at: ended_at,
                });
            }
        }

        snapshot
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("strategy panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("strategy panicked: {}", s)
    } else {
        "strategy panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentId, TriggerConfig};
    use crate::domain::capability::{Specification, Strategy, StrategyError};
    use crate::domain::context::AgentContext;
    use crate::infrastructure::repositories::InMemoryExecutionRepository;
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct NoConfig {}

    struct Flaky;

    #[async_trait]
    impl Strategy for Flaky {
        async fn run(&self, context: &mut AgentContext, input: Value) -> Result<(), StrategyError> {
            match input.as_str() {
                Some("fail") => Err(StrategyError::Failed("bad input".into())),
                Some("panic") => panic!("boom"),
                _ => {
                    context.log("ok");
                    Ok(())
                }
            }
        }
    }

    fn agent() -> Agent {
        let strategy = Specification::strategy("flaky", "test", |_: NoConfig| Flaky)
            .instantiate(&Value::Null)
            .unwrap();
        Agent::new(AgentId::from("a"), "a", "", vec![], strategy, TriggerConfig::webhook())
    }

    #[tokio::test]
    async fn test_failures_are_absorbed_and_recorded() {
        let repo = Arc::new(InMemoryExecutionRepository::new());
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let executor = AgentExecutor::new(repo.clone(), bus);
        let agent = agent();

        let snap = executor.execute(&agent, Value::from("go")).await;
        assert_eq!(snap.logs, vec!["ok".to_string()]);

        let snap = executor.execute(&agent, Value::from("fail")).await;
        assert_eq!(snap.logs.len(), 2);
        assert!(snap.logs[1].starts_with("ERROR: "));

        let snap = executor.execute(&agent, Value::from("panic")).await;
        assert_eq!(snap.logs.len(), 3);
        assert!(snap.logs[2].contains("boom"));

        let records = repo.find_by_agent(agent.id()).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().filter(|r| r.is_completed()).count(), 1);

        assert!(matches!(events.try_recv(), Ok(AgentLifecycleEvent::AgentRunCompleted { .. })));
        assert!(matches!(events.try_recv(), Ok(AgentLifecycleEvent::AgentRunFailed { .. })));
    }
}
