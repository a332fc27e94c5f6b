// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod executor;
pub mod lifecycle;
pub mod trigger;

pub use executor::AgentExecutor;
pub use lifecycle::AgentRuntime;
pub use trigger::{TriggerDispatcher, WebhookRoute};
