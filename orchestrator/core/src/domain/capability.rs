// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Capability Registries
//!
//! Tools and strategies are published as immutable **specifications**: a
//! unique name, a description, the JSON Schema of their configuration, and a
//! factory that binds a validated configuration into a live instance.
//!
//! | Type | Role |
//! |------|------|
//! | [`Tool`] / [`Strategy`] | Executable behavior of an instantiated capability |
//! | [`Specification`] | Immutable template: metadata + config schema + factory |
//! | [`Instance`] | A specification bound to one concrete, validated configuration |
//! | [`CapabilityRegistry`] | Name → specification catalog, populated once at boot |
//!
//! Registries are built with `&mut` access during startup and then frozen
//! behind an `Arc<Capabilities>`; nothing can register afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::context::AgentContext;

/// A configured capability an agent can invoke from its strategy.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}

/// The procedure an agent follows when it is run.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Optional hook invoked once by `initialize`, before the trigger is armed.
    async fn initialize(&self, _context: &mut AgentContext) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Execute one run. Implementations only ever append to the context.
    async fn run(&self, context: &mut AgentContext, input: Value) -> Result<(), StrategyError>;
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{0}' is not bound to this agent")]
    NotBound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Invalid strategy input: {0}")]
    InvalidInput(String),

    #[error("Strategy execution failed: {0}")]
    Failed(String),
}

/// Configuration did not match the shape declared by a specification.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Capability name cannot be empty")]
    EmptyName,

    #[error("Capability '{0}' is already registered")]
    DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityMetadata {
    pub name: String,
    pub description: String,
}

type Factory<K> = Box<dyn Fn(&Value) -> Result<Arc<K>, ConfigError> + Send + Sync>;

/// Immutable template for a tool or strategy.
pub struct Specification<K: ?Sized> {
    metadata: CapabilityMetadata,
    config_schema: RootSchema,
    factory: Factory<K>,
}

pub type ToolSpecification = Specification<dyn Tool>;
pub type StrategySpecification = Specification<dyn Strategy>;

impl<K: ?Sized> Specification<K> {
    pub fn metadata(&self) -> &CapabilityMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// JSON Schema of the configuration this specification accepts.
    pub fn config_schema(&self) -> &RootSchema {
        &self.config_schema
    }

    /// Validate `config` against the declared shape and bind it.
    pub fn instantiate(&self, config: &Value) -> Result<Instance<K>, ConfigError> {
        let handle = (self.factory)(config)?;
        Ok(Instance {
            name: self.metadata.name.clone(),
            config: config.clone(),
            handle,
        })
    }
}

impl Specification<dyn Tool> {
    /// Declare a tool whose configuration deserializes into `C`.
    pub fn tool<C, T, F>(name: &str, description: &str, build: F) -> Self
    where
        C: DeserializeOwned + JsonSchema,
        T: Tool + 'static,
        F: Fn(C) -> T + Send + Sync + 'static,
    {
        Self {
            metadata: CapabilityMetadata {
                name: name.to_string(),
                description: description.to_string(),
            },
            config_schema: schemars::schema_for!(C),
            factory: Box::new(move |raw: &Value| {
                let config = parse_config::<C>(raw)?;
                Ok(Arc::new(build(config)) as Arc<dyn Tool>)
            }),
        }
    }
}

impl Specification<dyn Strategy> {
    /// Declare a strategy whose configuration deserializes into `C`.
    pub fn strategy<C, S, F>(name: &str, description: &str, build: F) -> Self
    where
        C: DeserializeOwned + JsonSchema,
        S: Strategy + 'static,
        F: Fn(C) -> S + Send + Sync + 'static,
    {
        Self {
            metadata: CapabilityMetadata {
                name: name.to_string(),
                description: description.to_string(),
            },
            config_schema: schemars::schema_for!(C),
            factory: Box::new(move |raw: &Value| {
                let config = parse_config::<C>(raw)?;
                Ok(Arc::new(build(config)) as Arc<dyn Strategy>)
            }),
        }
    }
}

impl<K: ?Sized> fmt::Debug for Specification<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// A missing configuration (`null`) is treated as an empty object so that
/// configs made only of defaults need not be spelled out.
fn parse_config<C: DeserializeOwned>(raw: &Value) -> Result<C, ConfigError> {
    let raw = match raw {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(raw).map_err(|e| ConfigError(e.to_string()))
}

/// A specification bound to a concrete configuration, owned by one agent.
pub struct Instance<K: ?Sized> {
    name: String,
    config: Value,
    handle: Arc<K>,
}

pub type InstantiatedTool = Instance<dyn Tool>;
pub type InstantiatedStrategy = Instance<dyn Strategy>;

impl<K: ?Sized> Instance<K> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Value {
        &self.config
    }
}

impl Instance<dyn Tool> {
    pub async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        self.handle.execute(args).await
    }
}

impl Instance<dyn Strategy> {
    pub async fn initialize(&self, context: &mut AgentContext) -> Result<(), StrategyError> {
        self.handle.initialize(context).await
    }

    pub async fn run(&self, context: &mut AgentContext, input: Value) -> Result<(), StrategyError> {
        self.handle.run(context, input).await
    }
}

impl<K: ?Sized> Clone for Instance<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            config: self.config.clone(),
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<K: ?Sized> fmt::Debug for Instance<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Name-keyed catalog of specifications.
pub struct CapabilityRegistry<K: ?Sized> {
    entries: BTreeMap<String, Arc<Specification<K>>>,
}

pub type ToolRegistry = CapabilityRegistry<dyn Tool>;
pub type StrategyRegistry = CapabilityRegistry<dyn Strategy>;

impl<K: ?Sized> CapabilityRegistry<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a specification. The first registration under a name wins;
    /// later attempts fail and leave the catalog untouched.
    pub fn register(&mut self, spec: Specification<K>) -> Result<(), RegistryError> {
        let name = spec.name().trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.entries.insert(name, Arc::new(spec));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Specification<K>>> {
        self.entries.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn specifications(&self) -> impl Iterator<Item = &Specification<K>> {
        self.entries.values().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: ?Sized> Default for CapabilityRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Both catalogs, frozen after boot and shared by reference.
#[derive(Default)]
pub struct Capabilities {
    pub tools: ToolRegistry,
    pub strategies: StrategyRegistry,
}

impl Capabilities {
    pub fn new(tools: ToolRegistry, strategies: StrategyRegistry) -> Self {
        Self { tools, strategies }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct CounterConfig {
        #[serde(default)]
        start: u32,
    }

    struct Counter(u32);

    #[async_trait]
    impl Tool for Counter {
        async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
            Ok(Value::from(self.0))
        }
    }

    fn counter_spec(description: &str) -> ToolSpecification {
        Specification::tool("counter", description, |c: CounterConfig| Counter(c.start))
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = ToolRegistry::new();
        registry.register(counter_spec("first")).unwrap();

        let err = registry.register(counter_spec("second")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(ref n) if n == "counter"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("counter").unwrap().metadata().description, "first");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = ToolRegistry::new();
        let spec = Specification::tool("  ", "blank", |c: CounterConfig| Counter(c.start));
        assert!(matches!(registry.register(spec), Err(RegistryError::EmptyName)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_missing() {
        let registry = ToolRegistry::new();
        assert!(registry.lookup("nope").is_none());
    }

    #[tokio::test]
    async fn test_instantiate_validates_shape() {
        let spec = counter_spec("c");

        let tool = spec.instantiate(&serde_json::json!({"start": 7})).unwrap();
        assert_eq!(tool.execute(Value::Null).await.unwrap(), Value::from(7));

        // null means "all defaults"
        let tool = spec.instantiate(&Value::Null).unwrap();
        assert_eq!(tool.execute(Value::Null).await.unwrap(), Value::from(0));

        assert!(spec.instantiate(&serde_json::json!({"start": "seven"})).is_err());
        assert!(spec.instantiate(&serde_json::json!({"bogus": true})).is_err());
    }

    #[test]
    fn test_config_schema_describes_fields() {
        let spec = counter_spec("c");
        let schema = serde_json::to_value(spec.config_schema()).unwrap();
        assert!(schema["properties"]["start"].is_object());
    }
}
