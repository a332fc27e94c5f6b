// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Lifecycle Service
//!
//! [`AgentRuntime`] owns the agent registry and is the only path by which
//! agents are constructed, transitioned, run and removed. It is built once by
//! the host process and shared behind an `Arc`; the capability registries it
//! resolves blueprints against are read-only after construction.

use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::application::executor::AgentExecutor;
use crate::application::trigger::{TriggerDispatcher, WebhookRoute};
use crate::domain::agent::{Agent, AgentBlueprint, AgentError, AgentId, AgentState, AgentSummary};
use crate::domain::capability::Capabilities;
use crate::domain::context::ContextSnapshot;
use crate::domain::events::AgentLifecycleEvent;
use crate::domain::repository::ExecutionRepository;
use crate::infrastructure::event_bus::EventBus;

pub struct AgentRuntime {
    capabilities: Arc<Capabilities>,
    agents: DashMap<AgentId, Arc<Agent>>,
    executor: AgentExecutor,
    dispatcher: TriggerDispatcher,
    event_bus: EventBus,
}

impl AgentRuntime {
    pub fn new(
        capabilities: Arc<Capabilities>,
        executions: Arc<dyn ExecutionRepository>,
        event_bus: EventBus,
    ) -> Self {
        let executor = AgentExecutor::new(executions, event_bus.clone());
        Self {
            capabilities,
            agents: DashMap::new(),
            dispatcher: TriggerDispatcher::new(executor.clone()),
            executor,
            event_bus,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn executions(&self) -> Arc<dyn ExecutionRepository> {
        self.executor.executions()
    }

    /// Resolve `blueprint` and register the resulting agent in state CREATED.
    ///
    /// Construction is all-or-nothing: on any error the registry is left
    /// unchanged and no webhook route is held.
    pub fn create_agent(
        &self,
        id: AgentId,
        name: impl Into<String>,
        description: impl Into<String>,
        blueprint: AgentBlueprint,
    ) -> Result<Arc<Agent>, AgentError> {
        let mut tools = Vec::with_capacity(blueprint.tools.len());
        for tool in &blueprint.tools {
            let spec = self
                .capabilities
                .tools
                .lookup(&tool.name)
                .ok_or_else(|| AgentError::UnknownTool(tool.name.clone()))?;
            let instance = spec
                .instantiate(&tool.config)
                .map_err(|e| AgentError::InvalidToolConfig {
                    tool: tool.name.clone(),
                    reason: e.0,
                })?;
            tools.push(instance);
        }

        let strategy_name = &blueprint.strategy.name;
        let strategy = self
            .capabilities
            .strategies
            .lookup(strategy_name)
            .ok_or_else(|| AgentError::UnknownStrategy(strategy_name.clone()))?
            .instantiate(&blueprint.strategy.config)
            .map_err(|e| AgentError::InvalidStrategyConfig {
                strategy: strategy_name.clone(),
                reason: e.0,
            })?;

        blueprint.trigger.validate()?;

        let agent = match self.agents.entry(id.clone()) {
            Entry::Occupied(_) => return Err(AgentError::DuplicateAgentId(id)),
            Entry::Vacant(slot) => {
                self.dispatcher.reserve(&id, &blueprint.trigger)?;
                let agent = Arc::new(Agent::new(id, name, description, tools, strategy, blueprint.trigger));
                slot.insert(agent.clone());
                agent
            }
        };

        metrics::gauge!("colony_agents_registered").set(self.agents.len() as f64);
        info!(agent_id = %agent.id(), strategy = agent.strategy().name(), "Agent created");
        self.event_bus.publish(AgentLifecycleEvent::AgentCreated {
            agent_id: agent.id().clone(),
            name: agent.name().to_string(),
            created_at: Utc::now(),
        });

        Ok(agent)
    }

    /// Run the strategy's initialization hook, move CREATED → RUNNING and
    /// start trigger delivery.
    pub async fn initialize(&self, id: &AgentId) -> Result<(), AgentError> {
        let agent = self.agent(id)?;

        {
            // Holding the context lock keeps a second initialize (or a run)
            // from interleaving with the hook.
            let mut context = agent.context().lock().await;
            let state = agent.state();
            if state != AgentState::Created {
                return Err(AgentError::InvalidStateTransition {
                    from: state,
                    to: AgentState::Running,
                });
            }

            agent
                .strategy()
                .initialize(&mut *context)
                .await
                .map_err(|e| AgentError::StrategyInitialization(e.to_string()))?;

            agent.transition_with(AgentState::Running, || self.dispatcher.activate(agent.clone()))?;
        }

        info!(agent_id = %id, "Agent initialized");
        let now = Utc::now();
        self.event_bus.publish(AgentLifecycleEvent::AgentInitialized {
            agent_id: id.clone(),
            initialized_at: now,
        });
        self.event_bus.publish(AgentLifecycleEvent::AgentStateChanged {
            agent_id: id.clone(),
            from: AgentState::Created,
            to: AgentState::Running,
            changed_at: now,
        });
        Ok(())
    }

    /// Invoke the agent's strategy once. Allowed in any state; strategy
    /// failures are absorbed into the returned context.
    pub async fn run(&self, id: &AgentId, input: Value) -> Result<ContextSnapshot, AgentError> {
        let agent = self.agent(id)?;
        Ok(self.executor.execute(&agent, input).await)
    }

    pub async fn set_agent_state(&self, id: &AgentId, next: AgentState) -> Result<(), AgentError> {
        let agent = self.agent(id)?;
        let current = agent.state();

        if current == next {
            debug!(agent_id = %id, state = %next, "State unchanged");
            return Ok(());
        }

        if current == AgentState::Created && next == AgentState::Running {
            return self.initialize(id).await;
        }

        let previous = agent.transition_with(next, || match next {
            AgentState::Running => self.dispatcher.activate(agent.clone()),
            _ => self.dispatcher.deactivate(id, agent.trigger()),
        })?;

        info!(agent_id = %id, from = %previous, to = %next, "Agent state changed");
        self.event_bus.publish(AgentLifecycleEvent::AgentStateChanged {
            agent_id: id.clone(),
            from: previous,
            to: next,
            changed_at: Utc::now(),
        });
        Ok(())
    }

    /// Stop the agent, release its trigger and drop it from the registry.
    pub fn delete_agent(&self, id: &AgentId) -> Result<(), AgentError> {
        let (_, agent) = self
            .agents
            .remove(id)
            .ok_or_else(|| AgentError::AgentNotFound(id.clone()))?;

        let released = agent.transition_with(AgentState::Stopped, || self.dispatcher.release(id, agent.trigger()));
        if let Err(e) = released {
            warn!(agent_id = %id, "Unexpected state on delete: {}", e);
            self.dispatcher.release(id, agent.trigger());
        }

        metrics::gauge!("colony_agents_registered").set(self.agents.len() as f64);
        info!(agent_id = %id, "Agent deleted");
        self.event_bus.publish(AgentLifecycleEvent::AgentDeleted {
            agent_id: id.clone(),
            deleted_at: Utc::now(),
        });
        Ok(())
    }

    pub fn list_agents(&self) -> Vec<AgentSummary> {
        let mut summaries: Vec<_> = self.agents.iter().map(|a| a.summary()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn get_agent(&self, id: &AgentId) -> Result<AgentSummary, AgentError> {
        self.agent(id).map(|a| a.summary())
    }

    pub async fn get_logs(&self, id: &AgentId) -> Result<Vec<String>, AgentError> {
        let agent = self.agent(id)?;
        let context = agent.context().lock().await;
        Ok(context.logs().to_vec())
    }

    pub fn resolve_webhook(&self, path: &str) -> Option<WebhookRoute> {
        self.dispatcher.resolve_webhook(path)
    }

    pub fn agent(&self, id: &AgentId) -> Result<Arc<Agent>, AgentError> {
        self.agents
            .get(id)
            .map(|a| a.value().clone())
            .ok_or_else(|| AgentError::AgentNotFound(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn active_periodic_loops(&self) -> usize {
        self.dispatcher.active_loops()
    }
}
