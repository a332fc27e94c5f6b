// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Built-in Strategies
//
// - plan_execute: runs an explicit list of tool steps supplied as run input
// - sequential:   feeds the run input to every bound tool in order

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::capability::{Strategy, StrategyError, StrategySpecification};
use crate::domain::context::AgentContext;

pub const PLAN_RESULT_KEY: &str = "plan_result";

fn default_max_steps() -> usize {
    10
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PlanExecuteConfig {
    /// Steps beyond this count are rejected before anything runs
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Abort the plan on the first failing step
    #[serde(default = "default_true")]
    pub stop_on_error: bool,
}

#[derive(Debug, Deserialize)]
struct PlanStep {
    tool: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
struct Plan {
    steps: Vec<PlanStep>,
}

pub struct PlanExecuteStrategy {
    config: PlanExecuteConfig,
}

#[async_trait]
impl Strategy for PlanExecuteStrategy {
    async fn initialize(&self, context: &mut AgentContext) -> Result<(), StrategyError> {
        context.log(format!(
            "plan_execute ready with {} tool(s), max {} step(s)",
            context.tools().len(),
            self.config.max_steps
        ));
        Ok(())
    }

    async fn run(&self, context: &mut AgentContext, input: Value) -> Result<(), StrategyError> {
        let plan: Plan = serde_json::from_value(input)
            .map_err(|e| StrategyError::InvalidInput(format!("expected {{\"steps\": [...]}}: {}", e)))?;

        if plan.steps.len() > self.config.max_steps {
            return Err(StrategyError::InvalidInput(format!(
                "plan has {} steps, limit is {}",
                plan.steps.len(),
                self.config.max_steps
            )));
        }

        context.log(format!("Executing plan with {} step(s)", plan.steps.len()));

        let mut results = Vec::with_capacity(plan.steps.len());
        let mut failure = None;

        for (index, step) in plan.steps.into_iter().enumerate() {
            debug!(step = index + 1, tool = %step.tool, "Executing plan step");
            match context.use_tool(&step.tool, step.args).await {
                Ok(output) => {
                    context.log(format!("Step {} ({}) succeeded", index + 1, step.tool));
                    results.push(json!({ "step": index + 1, "tool": step.tool, "output": output }));
                }
                Err(e) => {
                    context.log(format!("Step {} ({}) failed: {}", index + 1, step.tool, e));
                    results.push(json!({ "step": index + 1, "tool": step.tool, "error": e.to_string() }));
                    if self.config.stop_on_error {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        // Partial results are kept even when the plan aborts.
        context.remember(PLAN_RESULT_KEY, Value::Array(results));

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

pub fn plan_execute() -> StrategySpecification {
    StrategySpecification::strategy(
        "plan_execute",
        "Runs an explicit list of tool invocations",
        |config: PlanExecuteConfig| PlanExecuteStrategy { config },
    )
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SequentialConfig {}

pub struct SequentialStrategy;

#[async_trait]
impl Strategy for SequentialStrategy {
    async fn initialize(&self, context: &mut AgentContext) -> Result<(), StrategyError> {
        context.log(format!("sequential ready with {} tool(s)", context.tools().len()));
        Ok(())
    }

    async fn run(&self, context: &mut AgentContext, input: Value) -> Result<(), StrategyError> {
        let names: Vec<String> = context.tools().iter().map(|t| t.name().to_string()).collect();

        for name in names {
            let output = context.use_tool(&name, input.clone()).await?;
            context.log(format!("{} completed", name));
            context.remember(format!("tool:{}", name), output);
        }
        Ok(())
    }
}

pub fn sequential() -> StrategySpecification {
    StrategySpecification::strategy(
        "sequential",
        "Passes the run input to every bound tool in order",
        |_: SequentialConfig| SequentialStrategy,
    )
}
