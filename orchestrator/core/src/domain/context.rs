// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Context
//!
//! Per-agent execution state: the bound tools, an append-only log and an
//! append-only key/value memory. Strategies receive `&mut AgentContext` during
//! a run; the type exposes no way to remove or rewrite earlier entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::capability::{InstantiatedTool, ToolError};

/// One appended memory value. Later entries for the same key shadow earlier
/// ones on `recall` but never replace them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub key: String,
    pub value: Value,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AgentContext {
    tools: Vec<InstantiatedTool>,
    logs: Vec<String>,
    memories: Vec<MemoryEntry>,
    // Names of tools invoked since the last `begin_run`, in first-use order.
    tools_used: Vec<String>,
}

impl AgentContext {
    pub fn new(tools: Vec<InstantiatedTool>) -> Self {
        Self {
            tools,
            logs: Vec::new(),
            memories: Vec::new(),
            tools_used: Vec::new(),
        }
    }

    pub fn tools(&self) -> &[InstantiatedTool] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<&InstantiatedTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn remember(&mut self, key: impl Into<String>, value: Value) {
        self.memories.push(MemoryEntry {
            key: key.into(),
            value,
            recorded_at: Utc::now(),
        });
    }

    /// Most recent value stored under `key`.
    pub fn recall(&self, key: &str) -> Option<&Value> {
        self.memories
            .iter()
            .rev()
            .find(|m| m.key == key)
            .map(|m| &m.value)
    }

    pub fn memories(&self) -> &[MemoryEntry] {
        &self.memories
    }

    /// Invoke one of the agent's bound tools, recording its use for the
    /// current run's execution record.
    pub async fn use_tool(&mut self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tool(name)
            .cloned()
            .ok_or_else(|| ToolError::NotBound(name.to_string()))?;

        if !self.tools_used.iter().any(|t| t == name) {
            self.tools_used.push(name.to_string());
        }

        debug!(tool = name, "Invoking tool");
        tool.execute(args).await
    }

    pub(crate) fn begin_run(&mut self) {
        self.tools_used.clear();
    }

    pub(crate) fn take_tools_used(&mut self) -> Vec<String> {
        std::mem::take(&mut self.tools_used)
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            tools: self.tools.iter().map(|t| t.name().to_string()).collect(),
            logs: self.logs.clone(),
            memories: self.memories.clone(),
        }
    }
}

/// Serializable copy of a context, returned from `run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub tools: Vec<String>,
    pub logs: Vec<String>,
    pub memories: Vec<MemoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capability::{Specification, Tool};
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct NoConfig {}

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        async fn execute(&self, args: Value) -> Result<Value, ToolError> {
            let text = args
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("expected string".into()))?;
            Ok(Value::from(text.to_uppercase()))
        }
    }

    fn context_with_upper() -> AgentContext {
        let spec = Specification::tool("upper", "uppercase", |_: NoConfig| Upper);
        AgentContext::new(vec![spec.instantiate(&Value::Null).unwrap()])
    }

    #[test]
    fn test_recall_returns_latest_without_dropping_history() {
        let mut ctx = AgentContext::new(vec![]);
        ctx.remember("k", Value::from(1));
        ctx.remember("k", Value::from(2));

        assert_eq!(ctx.recall("k"), Some(&Value::from(2)));
        assert_eq!(ctx.memories().len(), 2);
        assert!(ctx.recall("missing").is_none());
    }

    #[tokio::test]
    async fn test_use_tool_tracks_names_once() {
        let mut ctx = context_with_upper();
        ctx.begin_run();

        let out = ctx.use_tool("upper", Value::from("hi")).await.unwrap();
        assert_eq!(out, Value::from("HI"));
        ctx.use_tool("upper", Value::from("again")).await.unwrap();

        assert_eq!(ctx.take_tools_used(), vec!["upper".to_string()]);
        assert!(ctx.take_tools_used().is_empty());
    }

    #[tokio::test]
    async fn test_use_unbound_tool() {
        let mut ctx = context_with_upper();
        let err = ctx.use_tool("missing", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::NotBound(_)));
        assert!(ctx.take_tools_used().is_empty());
    }

    #[test]
    fn test_snapshot_lists_tool_names() {
        let mut ctx = context_with_upper();
        ctx.log("hello");
        let snap = ctx.snapshot();
        assert_eq!(snap.tools, vec!["upper".to_string()]);
        assert_eq!(snap.logs, vec!["hello".to_string()]);
    }
}
