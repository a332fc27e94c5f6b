// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Topology Builder
//!
//! Clusters agents into swarms with union-find over strong edges, then scores
//! each swarm against the three coordination patterns.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use colony_core::domain::agent::AgentId;
use tracing::debug;

use crate::domain::connection::AgentConnection;
use crate::domain::topology::{PatternScores, PatternSummary, SwarmId, SwarmTopology};

/// Edges weaker than this never merge two agents into one swarm.
pub const COORDINATION_THRESHOLD: f64 = 0.3;
pub const MIN_SWARM_SIZE: usize = 2;

/// Disjoint-set forest over dense indices, with path halving and union by
/// size.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder;

impl TopologyBuilder {
    pub fn new() -> Self {
        Self
    }

    /// One topology per connected component of at least two agents, ordered
    /// by smallest member id.
    pub fn build(&self, connections: &[AgentConnection]) -> Vec<SwarmTopology> {
        let agents: BTreeSet<&AgentId> = connections
            .iter()
            .flat_map(|c| [&c.source, &c.target])
            .collect();
        let index: BTreeMap<&AgentId, usize> = agents.iter().enumerate().map(|(i, a)| (*a, i)).collect();

        let mut forest = UnionFind::new(agents.len());
        for c in connections.iter().filter(|c| c.strength >= COORDINATION_THRESHOLD) {
            forest.union(index[&c.source], index[&c.target]);
        }

        let mut components: BTreeMap<usize, BTreeSet<AgentId>> = BTreeMap::new();
        for (agent, &i) in &index {
            components.entry(forest.find(i)).or_default().insert((*agent).clone());
        }

        let mut swarms: Vec<SwarmTopology> = components
            .into_values()
            .filter(|members| members.len() >= MIN_SWARM_SIZE)
            .map(|members| {
                let edges: Vec<AgentConnection> = connections
                    .iter()
                    .filter(|c| members.contains(&c.source) && members.contains(&c.target))
                    .cloned()
                    .collect();
                let pattern = PatternSummary::from(pattern_scores(&members, &edges));
                debug!(
                    members = members.len(),
                    edges = edges.len(),
                    pattern = %pattern.dominant,
                    "Built swarm topology"
                );
                SwarmTopology {
                    id: SwarmId::for_members(&members),
                    members,
                    connections: edges,
                    pattern,
                    performance: None,
                }
            })
            .collect();

        swarms.sort_by(|a, b| a.members.iter().next().cmp(&b.members.iter().next()));
        swarms
    }
}

/// Hierarchical, collaborative and pipeline scores for one component.
///
/// Degrees count distinct neighbours, so several connection types between the
/// same ordered pair add one to each degree.
pub fn pattern_scores(members: &BTreeSet<AgentId>, connections: &[AgentConnection]) -> PatternScores {
    let n = members.len();
    if n == 0 || connections.is_empty() {
        return PatternScores::default();
    }

    let pairs: HashSet<(&AgentId, &AgentId)> = connections
        .iter()
        .filter(|c| c.source != c.target)
        .map(|c| (&c.source, &c.target))
        .collect();

    let mut out_degree: BTreeMap<&AgentId, usize> = members.iter().map(|m| (m, 0)).collect();
    let mut in_degree = out_degree.clone();
    for (source, target) in &pairs {
        if let Some(d) = out_degree.get_mut(source) {
            *d += 1;
        }
        if let Some(d) = in_degree.get_mut(target) {
            *d += 1;
        }
    }

    let max_out = out_degree.values().copied().max().unwrap_or(0);
    let hierarchical = if max_out as f64 >= n as f64 / 2.0 {
        max_out as f64 / n as f64
    } else {
        0.0
    };

    let reciprocal = pairs
        .iter()
        .filter(|(source, target)| pairs.contains(&(*target, *source)))
        .count();
    let collaborative = (reciprocal as f64 / 2.0) / pairs.len() as f64;

    let chain_members = members
        .iter()
        .filter(|m| {
            let (i, o) = (in_degree[m], out_degree[m]);
            matches!((i, o), (1, 1) | (0, 1..) | (1.., 0))
        })
        .count();
    let pipeline = chain_members as f64 / n as f64;

    PatternScores {
        hierarchical,
        collaborative,
        pipeline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::ConnectionType;
    use crate::domain::topology::CoordinationPattern;
    use chrono::Utc;

    fn edge(source: &str, target: &str, strength: f64) -> AgentConnection {
        AgentConnection::new(
            AgentId::from(source),
            AgentId::from(target),
            ConnectionType::DelegatesTo,
            strength,
            Utc::now(),
        )
    }

    #[test]
    fn test_pair_becomes_swarm() {
        let swarms = TopologyBuilder::new().build(&[edge("x", "y", 0.5)]);
        assert_eq!(swarms.len(), 1);
        assert_eq!(swarms[0].members.len(), 2);
        assert_eq!(swarms[0].connections.len(), 1);
    }

    #[test]
    fn test_weak_edges_do_not_merge() {
        assert!(TopologyBuilder::new().build(&[edge("x", "y", 0.29)]).is_empty());
        assert!(TopologyBuilder::new().build(&[]).is_empty());
    }

    #[test]
    fn test_weak_intra_component_edges_are_kept() {
        let swarms = TopologyBuilder::new().build(&[edge("a", "b", 0.5), edge("b", "c", 0.5), edge("c", "a", 0.1)]);
        assert_eq!(swarms.len(), 1);
        assert_eq!(swarms[0].connections.len(), 3);
    }

    #[test]
    fn test_pipeline_chain() {
        let swarms = TopologyBuilder::new().build(&[edge("a", "b", 0.5), edge("b", "c", 0.5)]);
        assert_eq!(swarms.len(), 1);
        let pattern = &swarms[0].pattern;
        assert!((pattern.scores.pipeline - 1.0).abs() < 1e-9);
        assert_eq!(pattern.dominant, CoordinationPattern::Pipeline);
        assert!((pattern.dominant_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hub_is_hierarchical() {
        let edges = [
            edge("boss", "w1", 0.6),
            edge("boss", "w2", 0.6),
            edge("boss", "w3", 0.6),
        ];
        let swarms = TopologyBuilder::new().build(&edges);
        let scores = swarms[0].pattern.scores;
        assert!((scores.hierarchical - 0.75).abs() < 1e-9);
        // Every member is a source or a sink
        assert!((scores.pipeline - 1.0).abs() < 1e-9);
        assert_eq!(swarms[0].pattern.dominant, CoordinationPattern::Pipeline);
    }

    #[test]
    fn test_mutual_edges_are_collaborative() {
        let edges = [
            edge("a", "b", 0.6),
            edge("b", "a", 0.6),
            edge("b", "c", 0.6),
            edge("c", "b", 0.6),
            edge("a", "c", 0.6),
            edge("c", "a", 0.6),
        ];
        let scores = TopologyBuilder::new().build(&edges)[0].pattern.scores;
        assert!((scores.collaborative - 0.5).abs() < 1e-9);
        assert!((scores.hierarchical - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(scores.pipeline, 0.0);
    }

    #[test]
    fn test_partition_property() {
        let edges = [
            edge("a", "b", 0.9),
            edge("b", "c", 0.4),
            edge("d", "e", 0.3),
            edge("e", "f", 0.2),
            edge("g", "h", 0.1),
            edge("c", "a", 0.8),
        ];
        let swarms = TopologyBuilder::new().build(&edges);
        assert_eq!(swarms.len(), 2);

        let mut seen = BTreeSet::new();
        for swarm in &swarms {
            assert!(swarm.members.len() >= MIN_SWARM_SIZE);
            for member in &swarm.members {
                assert!(seen.insert(member.clone()), "{} appears in two swarms", member);
            }
            for c in &swarm.connections {
                assert!(swarm.contains(&c.source) && swarm.contains(&c.target));
            }
        }
        assert!(!seen.contains(&AgentId::from("f")));
        assert!(!seen.contains(&AgentId::from("g")));
    }
}
