// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Topology
//!
//! A [`SwarmTopology`] is a snapshot: it is rebuilt wholesale on every
//! analysis pass and never mutated incrementally.
//!
//! ## Invariants
//!
//! - At least two members.
//! - Every connection has both endpoints among the members.
//! - An agent belongs to at most one topology per analysis pass.

use std::collections::BTreeSet;
use std::fmt;

use colony_core::domain::agent::AgentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::connection::AgentConnection;

/// Deterministic identifier derived from the member set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SwarmId(pub Uuid);

impl SwarmId {
    /// The same members always yield the same id, across passes and
    /// processes.
    pub fn for_members(members: &BTreeSet<AgentId>) -> Self {
        let joined = members
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, joined.as_bytes()))
    }
}

impl fmt::Display for SwarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationPattern {
    /// One coordinator, many workers
    Hierarchical,
    /// Mutual edges
    Collaborative,
    /// Linear chain
    Pipeline,
}

impl fmt::Display for CoordinationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CoordinationPattern::Hierarchical => "hierarchical",
            CoordinationPattern::Collaborative => "collaborative",
            CoordinationPattern::Pipeline => "pipeline",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternScores {
    pub hierarchical: f64,
    pub collaborative: f64,
    pub pipeline: f64,
}

impl PatternScores {
    /// Highest-scoring pattern; ties go to the earlier of hierarchical,
    /// collaborative, pipeline.
    pub fn dominant(&self) -> (CoordinationPattern, f64) {
        let candidates = [
            (CoordinationPattern::Hierarchical, self.hierarchical),
            (CoordinationPattern::Collaborative, self.collaborative),
            (CoordinationPattern::Pipeline, self.pipeline),
        ];

        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub scores: PatternScores,
    pub dominant: CoordinationPattern,
    pub dominant_score: f64,
}

impl From<PatternScores> for PatternSummary {
    fn from(scores: PatternScores) -> Self {
        let (dominant, dominant_score) = scores.dominant();
        Self {
            scores,
            dominant,
            dominant_score,
        }
    }
}

/// Aggregated member performance plus the coordination score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SwarmPerformance {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    /// Members with analytics data
    pub members_with_data: usize,
    /// Mean of member success rates, in percent
    pub avg_success_rate: f64,
    pub avg_execution_time_ms: f64,
    /// `[0, 1]`
    pub coordination_effectiveness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmTopology {
    pub id: SwarmId,
    pub members: BTreeSet<AgentId>,
    pub connections: Vec<AgentConnection>,
    pub pattern: PatternSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<SwarmPerformance>,
}

impl SwarmTopology {
    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.members.contains(agent_id)
    }

    pub fn mean_connection_strength(&self) -> f64 {
        if self.connections.is_empty() {
            return 0.0;
        }
        self.connections.iter().map(|c| c.strength).sum::<f64>() / self.connections.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_tie_breaks_in_order() {
        let scores = PatternScores {
            hierarchical: 0.5,
            collaborative: 0.5,
            pipeline: 0.5,
        };
        assert_eq!(scores.dominant().0, CoordinationPattern::Hierarchical);

        let scores = PatternScores {
            hierarchical: 0.0,
            collaborative: 0.4,
            pipeline: 0.4,
        };
        assert_eq!(scores.dominant().0, CoordinationPattern::Collaborative);

        let scores = PatternScores {
            hierarchical: 0.2,
            collaborative: 0.0,
            pipeline: 1.0,
        };
        assert_eq!(scores.dominant(), (CoordinationPattern::Pipeline, 1.0));
    }

    #[test]
    fn test_pattern_summary_wire_format() {
        let summary = PatternSummary::from(PatternScores {
            hierarchical: 0.0,
            collaborative: 0.25,
            pipeline: 1.0,
        });
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["dominant"], "pipeline");
        assert_eq!(json["scores"]["collaborative"], 0.25);
    }

    #[test]
    fn test_swarm_id_is_deterministic() {
        let a: BTreeSet<AgentId> = ["x", "y"].into_iter().map(AgentId::from).collect();
        let b: BTreeSet<AgentId> = ["y", "x"].into_iter().map(AgentId::from).collect();
        let c: BTreeSet<AgentId> = ["x", "z"].into_iter().map(AgentId::from).collect();
        assert_eq!(SwarmId::for_members(&a), SwarmId::for_members(&b));
        assert_ne!(SwarmId::for_members(&a), SwarmId::for_members(&c));
    }
}
