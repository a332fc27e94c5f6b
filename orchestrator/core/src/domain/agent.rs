// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Aggregate
//!
//! An [`Agent`] binds an identity to exactly one instantiated strategy, one
//! trigger and an [`AgentContext`] holding its tools. Agents are only built by
//! `AgentRuntime::create_agent`, which resolves an [`AgentBlueprint`] against
//! the capability registries; a partially-resolved agent is never visible.
//!
//! ## Lifecycle
//!
//! ```text
//! CREATED ──initialize──▶ RUNNING ⇄ PAUSED
//!    │                       │        │
//!    └───────────────────────┴────────┴──▶ STOPPED (terminal)
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::capability::{InstantiatedStrategy, InstantiatedTool};
use crate::domain::context::AgentContext;

/// Caller-chosen agent identifier, unique within a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    Created,
    Running,
    Paused,
    Stopped,
}

impl AgentState {
    /// Edges of the lifecycle diagram. Re-entering the current state is
    /// allowed and treated as a no-op by callers.
    pub fn can_transition_to(self, next: AgentState) -> bool {
        use AgentState::*;
        match (self, next) {
            (current, next) if current == next => true,
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Created, Running) | (Running, Paused) | (Paused, Running) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AgentState::Stopped)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::Created => "CREATED",
            AgentState::Running => "RUNNING",
            AgentState::Paused => "PAUSED",
            AgentState::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Activation mechanism. Serialized as `{"type": "...", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "lowercase")]
pub enum TriggerConfig {
    Periodic {
        /// Seconds between scheduled runs
        interval: u64,
    },
    Webhook {
        /// Route under `/webhooks/`; defaults to the agent id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        /// HTTP method accepted on the route
        #[serde(default = "default_webhook_method")]
        method: String,
    },
}

fn default_webhook_method() -> String {
    "POST".to_string()
}

impl TriggerConfig {
    pub fn webhook() -> Self {
        TriggerConfig::Webhook {
            path: None,
            method: default_webhook_method(),
        }
    }

    pub fn periodic(interval: u64) -> Self {
        TriggerConfig::Periodic { interval }
    }

    /// Normalized webhook route for `agent_id`, or `None` for periodic triggers.
    pub fn webhook_path(&self, agent_id: &AgentId) -> Option<String> {
        match self {
            TriggerConfig::Webhook { path, .. } => {
                let raw = path.as_deref().unwrap_or(agent_id.as_str());
                Some(raw.trim_matches('/').to_string())
            }
            TriggerConfig::Periodic { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        match self {
            TriggerConfig::Periodic { interval: 0 } => Err(AgentError::InvalidTrigger(
                "periodic interval must be at least 1 second".to_string(),
            )),
            TriggerConfig::Webhook { path: Some(p), .. } if p.trim_matches('/').is_empty() => {
                Err(AgentError::InvalidTrigger("webhook path cannot be empty".to_string()))
            }
            TriggerConfig::Webhook { method, .. } if method.trim().is_empty() => {
                Err(AgentError::InvalidTrigger("webhook method cannot be empty".to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolBlueprint {
    pub name: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyBlueprint {
    pub name: String,
    #[serde(default)]
    pub config: Value,
}

/// Declarative recipe for an agent: tools, strategy and trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBlueprint {
    #[serde(default)]
    pub tools: Vec<ToolBlueprint>,
    pub strategy: StrategyBlueprint,
    pub trigger: TriggerConfig,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid configuration for tool '{tool}': {reason}")]
    InvalidToolConfig { tool: String, reason: String },

    #[error("Invalid configuration for strategy '{strategy}': {reason}")]
    InvalidStrategyConfig { strategy: String, reason: String },

    #[error("Invalid trigger: {0}")]
    InvalidTrigger(String),

    #[error("Agent '{0}' already exists")]
    DuplicateAgentId(AgentId),

    #[error("Webhook path '/{0}' is already bound to another agent")]
    DuplicateWebhookPath(String),

    #[error("Agent '{0}' not found")]
    AgentNotFound(AgentId),

    #[error("Invalid state transition {from} -> {to}")]
    InvalidStateTransition { from: AgentState, to: AgentState },

    #[error("Strategy initialization failed: {0}")]
    StrategyInitialization(String),
}

pub struct Agent {
    id: AgentId,
    name: String,
    description: String,
    strategy: InstantiatedStrategy,
    trigger: TriggerConfig,
    tool_names: Vec<String>,
    state: RwLock<AgentState>,
    // Held across a state change and the trigger update that follows it.
    lifecycle: parking_lot::Mutex<()>,
    // Serializes runs: at most one strategy invocation per agent at a time.
    context: Mutex<AgentContext>,
    created_at: DateTime<Utc>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        description: impl Into<String>,
        tools: Vec<InstantiatedTool>,
        strategy: InstantiatedStrategy,
        trigger: TriggerConfig,
    ) -> Self {
        let tool_names = tools.iter().map(|t| t.name().to_string()).collect();
        Self {
            id,
            name: name.into(),
            description: description.into(),
            strategy,
            trigger,
            tool_names,
            state: RwLock::new(AgentState::Created),
            lifecycle: parking_lot::Mutex::new(()),
            context: Mutex::new(AgentContext::new(tools)),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn strategy(&self) -> &InstantiatedStrategy {
        &self.strategy
    }

    pub fn trigger(&self) -> &TriggerConfig {
        &self.trigger
    }

    pub fn state(&self) -> AgentState {
        *self.state.read()
    }

    pub fn context(&self) -> &Mutex<AgentContext> {
        &self.context
    }

    /// Move to `next` if the lifecycle diagram allows it, returning the
    /// previous state.
    pub fn transition(&self, next: AgentState) -> Result<AgentState, AgentError> {
        let mut state = self.state.write();
        let current = *state;
        if !current.can_transition_to(next) {
            return Err(AgentError::InvalidStateTransition {
                from: current,
                to: next,
            });
        }
        *state = next;
        Ok(current)
    }

    /// [`transition`](Self::transition), then `apply` before any other
    /// lifecycle transition of this agent can start. Side effects of
    /// concurrent transitions land in the same order as the state changes.
    pub fn transition_with(&self, next: AgentState, apply: impl FnOnce()) -> Result<AgentState, AgentError> {
        let _lifecycle = self.lifecycle.lock();
        let previous = self.transition(next)?;
        apply();
        Ok(previous)
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            state: self.state(),
            strategy: self.strategy.name().to_string(),
            tools: self.tool_names.clone(),
            trigger: self.trigger.clone(),
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field("strategy", &self.strategy.name())
            .field("trigger", &self.trigger)
            .finish()
    }
}

/// Read model of an agent for listings and API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: AgentId,
    pub name: String,
    pub description: String,
    pub state: AgentState,
    pub strategy: String,
    pub tools: Vec<String>,
    pub trigger: TriggerConfig,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use AgentState::*;

    #[test]
    fn test_state_diagram() {
        assert!(Created.can_transition_to(Running));
        assert!(Running.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Running));
        for s in [Created, Running, Paused] {
            assert!(s.can_transition_to(Stopped));
        }

        assert!(!Created.can_transition_to(Paused));
        assert!(!Stopped.can_transition_to(Running));
        assert!(!Stopped.can_transition_to(Created));
        assert!(!Running.can_transition_to(Created));
        assert!(Stopped.is_terminal());
    }

    #[test]
    fn test_trigger_wire_format() {
        let t: TriggerConfig =
            serde_json::from_str(r#"{"type":"webhook","params":{"path":"/investigate"}}"#).unwrap();
        assert_eq!(
            t,
            TriggerConfig::Webhook {
                path: Some("/investigate".into()),
                method: "POST".into()
            }
        );
        assert_eq!(t.webhook_path(&AgentId::from("a")), Some("investigate".to_string()));

        let t: TriggerConfig =
            serde_json::from_str(r#"{"type":"periodic","params":{"interval":30}}"#).unwrap();
        assert_eq!(t, TriggerConfig::periodic(30));
        assert_eq!(t.webhook_path(&AgentId::from("a")), None);
    }

    #[test]
    fn test_default_webhook_path_is_agent_id() {
        let t = TriggerConfig::webhook();
        assert_eq!(t.webhook_path(&AgentId::from("plan-agent")), Some("plan-agent".to_string()));
    }

    #[test]
    fn test_trigger_validation() {
        assert!(TriggerConfig::periodic(0).validate().is_err());
        assert!(TriggerConfig::periodic(5).validate().is_ok());
        let blank = TriggerConfig::Webhook {
            path: Some("/".into()),
            method: "POST".into(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_agent_state_serde() {
        assert_eq!(serde_json::to_string(&Paused).unwrap(), "\"PAUSED\"");
        let s: AgentState = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(s, Running);
    }
}
