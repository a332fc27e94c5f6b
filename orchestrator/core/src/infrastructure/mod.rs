// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod analytics;
pub mod capabilities;
pub mod event_bus;
pub mod repositories;

pub use analytics::ExecutionPerformanceAnalytics;
pub use capabilities::builtin_capabilities;
pub use event_bus::{EventBus, EventBusError};
pub use repositories::InMemoryExecutionRepository;
