// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Built-in Capabilities
//!
//! Default tool and strategy catalogs registered by the host at startup.

pub mod strategies;
pub mod tools;

use crate::domain::capability::{Capabilities, RegistryError, StrategyRegistry, ToolRegistry};

/// Registries pre-populated with every built-in tool and strategy.
pub fn builtin_capabilities() -> Result<Capabilities, RegistryError> {
    let mut tool_registry = ToolRegistry::new();
    tool_registry.register(tools::ping())?;
    tool_registry.register(tools::echo())?;
    tool_registry.register(tools::http_get())?;

    let mut strategy_registry = StrategyRegistry::new();
    strategy_registry.register(strategies::plan_execute())?;
    strategy_registry.register(strategies::sequential())?;

    Ok(Capabilities::new(tool_registry, strategy_registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let caps = builtin_capabilities().unwrap();
        assert_eq!(caps.tools.names().collect::<Vec<_>>(), vec!["echo", "http_get", "ping"]);
        assert_eq!(caps.strategies.names().collect::<Vec<_>>(), vec!["plan_execute", "sequential"]);
    }
}
