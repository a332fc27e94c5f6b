// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Connections
//!
//! - [`AgentConnection`] - directed, weighted edge inferred between two agents.
//! - [`ConnectionType`] - how the source appears to relate to the target.
//! - [`ConnectionRepository`] - persistence port, upsert keyed by
//!   `(source, target, type)`.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use colony_core::domain::agent::AgentId;
use colony_core::domain::repository::RepositoryError;
use serde::{Deserialize, Serialize};

/// Upsert key: `(source, target, type)`.
pub type ConnectionKey = (AgentId, AgentId, ConnectionType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    DelegatesTo,
    FeedsDataTo,
    CoordinatesWith,
    ReceivesFrom,
    CompetesWith,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionType::DelegatesTo => "delegates_to",
            ConnectionType::FeedsDataTo => "feeds_data_to",
            ConnectionType::CoordinatesWith => "coordinates_with",
            ConnectionType::ReceivesFrom => "receives_from",
            ConnectionType::CompetesWith => "competes_with",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConnection {
    pub source: AgentId,
    pub target: AgentId,
    pub connection_type: ConnectionType,
    /// Evidence weight in `[0, 1]`
    pub strength: f64,
    pub last_interaction: DateTime<Utc>,
    pub active: bool,
}

impl AgentConnection {
    pub fn new(
        source: AgentId,
        target: AgentId,
        connection_type: ConnectionType,
        strength: f64,
        last_interaction: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            target,
            connection_type,
            strength: strength.clamp(0.0, 1.0),
            last_interaction,
            active: true,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        (self.source.clone(), self.target.clone(), self.connection_type)
    }
}

#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Insert or replace the connection with the same `(source, target, type)`.
    async fn upsert(&self, connection: &AgentConnection) -> Result<(), RepositoryError>;

    async fn list_active(&self) -> Result<Vec<AgentConnection>, RepositoryError>;

    /// Mark every active connection whose key is not in `current` inactive;
    /// returns how many were changed.
    async fn deactivate_except(&self, current: &[ConnectionKey]) -> Result<usize, RepositoryError>;
}
