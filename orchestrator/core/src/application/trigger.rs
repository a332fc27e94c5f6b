// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Trigger Dispatcher
//!
//! Binds agents to the mechanism that starts their runs.
//!
//! - **Periodic**: one background task per RUNNING agent, cancelled on pause,
//!   stop or delete through its `CancellationToken`.
//! - **Webhook**: a route table keyed by normalized path. The route is
//!   reserved when the agent is created and only accepts calls while armed
//!   (agent RUNNING).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::executor::AgentExecutor;
use crate::domain::agent::{Agent, AgentError, AgentId, AgentState, TriggerConfig};

#[derive(Debug, Clone)]
pub struct WebhookRoute {
    pub agent_id: AgentId,
    pub method: String,
    pub armed: bool,
}

/// A running periodic task. `generation` tells a loop that is exiting on
/// its own whether the entry is still its own.
struct PeriodicLoop {
    generation: u64,
    token: CancellationToken,
}

type LoopTable = Arc<DashMap<AgentId, PeriodicLoop>>;

pub struct TriggerDispatcher {
    executor: AgentExecutor,
    loops: LoopTable,
    generations: AtomicU64,
    webhooks: DashMap<String, WebhookRoute>,
}

impl TriggerDispatcher {
    pub fn new(executor: AgentExecutor) -> Self {
        Self {
            executor,
            loops: Arc::new(DashMap::new()),
            generations: AtomicU64::new(0),
            webhooks: DashMap::new(),
        }
    }

    /// Claim the agent's webhook path, if it has one. Called before the agent
    /// becomes visible so a conflicting path rejects the whole creation.
    pub fn reserve(&self, agent_id: &AgentId, trigger: &TriggerConfig) -> Result<(), AgentError> {
        let (Some(path), TriggerConfig::Webhook { method, .. }) = (trigger.webhook_path(agent_id), trigger) else {
            return Ok(());
        };

        match self.webhooks.entry(path) {
            Entry::Occupied(e) => Err(AgentError::DuplicateWebhookPath(e.key().clone())),
            Entry::Vacant(e) => {
                debug!(agent_id = %agent_id, path = %e.key(), "Reserved webhook route");
                e.insert(WebhookRoute {
                    agent_id: agent_id.clone(),
                    method: method.to_ascii_uppercase(),
                    armed: false,
                });
                Ok(())
            }
        }
    }

    /// Start delivering triggers to a RUNNING agent.
    pub fn activate(&self, agent: Arc<Agent>) {
        match agent.trigger() {
            TriggerConfig::Periodic { interval } => {
                let every = Duration::from_secs(*interval);
                let token = CancellationToken::new();
                let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                let entry = PeriodicLoop {
                    generation,
                    token: token.clone(),
                };
                if let Some(previous) = self.loops.insert(agent.id().clone(), entry) {
                    previous.token.cancel();
                }
                info!(agent_id = %agent.id(), interval_secs = *interval, "Starting periodic trigger");
                tokio::spawn(periodic_loop(
                    self.executor.clone(),
                    self.loops.clone(),
                    agent,
                    every,
                    PeriodicLoop { generation, token },
                ));
            }
            TriggerConfig::Webhook { .. } => self.set_armed(agent.id(), agent.trigger(), true),
        }
    }

    /// Stop delivering triggers. Webhook routes stay reserved.
    pub fn deactivate(&self, agent_id: &AgentId, trigger: &TriggerConfig) {
        if let Some((_, running)) = self.loops.remove(agent_id) {
            debug!(agent_id = %agent_id, "Cancelling periodic trigger");
            running.token.cancel();
        }
        self.set_armed(agent_id, trigger, false);
    }

    /// Deactivate and give the webhook path back.
    pub fn release(&self, agent_id: &AgentId, trigger: &TriggerConfig) {
        self.deactivate(agent_id, trigger);
        if let Some(path) = trigger.webhook_path(agent_id) {
            self.webhooks.remove_if(&path, |_, route| &route.agent_id == agent_id);
        }
    }

    pub fn resolve_webhook(&self, path: &str) -> Option<WebhookRoute> {
        self.webhooks
            .get(path.trim_matches('/'))
            .map(|route| route.value().clone())
    }

    pub fn active_loops(&self) -> usize {
        self.loops.len()
    }

    fn set_armed(&self, agent_id: &AgentId, trigger: &TriggerConfig, armed: bool) {
        if let Some(path) = trigger.webhook_path(agent_id) {
            if let Some(mut route) = self.webhooks.get_mut(&path) {
                route.armed = armed;
            }
        }
    }
}

async fn periodic_loop(executor: AgentExecutor, loops: LoopTable, agent: Arc<Agent>, every: Duration, handle: PeriodicLoop) {
    let PeriodicLoop { generation, token } = handle;
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // A cancellation that raced the tick wins; so does a state change
        // that has not reached the dispatcher yet.
        if token.is_cancelled() || agent.state() != AgentState::Running {
            break;
        }

        executor.execute(&agent, Value::Null).await;
    }

    // Leaving on a state change nobody reported: drop our own entry so the
    // table only lists live loops. A newer loop's entry is left alone.
    loops.remove_if(agent.id(), |_, entry| entry.generation == generation);
    debug!(agent_id = %agent.id(), "Periodic trigger stopped");
}
