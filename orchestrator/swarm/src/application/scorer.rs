// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use colony_core::domain::analytics::PerformanceSummary;

use crate::domain::topology::{SwarmPerformance, SwarmTopology};

const CONSISTENCY_WEIGHT: f64 = 0.4;
const STRENGTH_WEIGHT: f64 = 0.4;
const PATTERN_WEIGHT: f64 = 0.2;

/// Combines member performance with topology into one effectiveness score.
#[derive(Debug, Clone, Default)]
pub struct PerformanceScorer;

impl PerformanceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate `summaries` (one per member with data) for `topology`.
    pub fn score(&self, topology: &SwarmTopology, summaries: &[PerformanceSummary]) -> SwarmPerformance {
        let mut performance = SwarmPerformance {
            members_with_data: summaries.len(),
            ..SwarmPerformance::default()
        };
        if summaries.is_empty() {
            return performance;
        }

        let count = summaries.len() as f64;
        performance.total_executions = summaries.iter().map(|s| s.total_executions).sum();
        performance.successful_executions = summaries.iter().map(|s| s.successful_executions).sum();
        performance.failed_executions = summaries.iter().map(|s| s.failed_executions).sum();
        performance.avg_success_rate = summaries.iter().map(|s| s.success_rate).sum::<f64>() / count;
        performance.avg_execution_time_ms = summaries.iter().map(|s| s.avg_execution_time_ms).sum::<f64>() / count;

        if summaries.len() >= 2 {
            let rates: Vec<f64> = summaries.iter().map(|s| s.success_rate).collect();
            let effectiveness = CONSISTENCY_WEIGHT * (1.0 - sample_std_dev(&rates) / 100.0)
                + STRENGTH_WEIGHT * topology.mean_connection_strength()
                + PATTERN_WEIGHT * topology.pattern.dominant_score;
            performance.coordination_effectiveness = effectiveness.clamp(0.0, 1.0);
        }

        performance
    }
}

/// Sample (n - 1) standard deviation; zero for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::topology_builder::TopologyBuilder;
    use crate::domain::connection::{AgentConnection, ConnectionType};
    use chrono::Utc;
    use colony_core::domain::agent::AgentId;

    fn summary(id: &str, success_rate: f64, total: u64) -> PerformanceSummary {
        let successful = (total as f64 * success_rate / 100.0).round() as u64;
        PerformanceSummary {
            agent_id: AgentId::from(id),
            success_rate,
            avg_execution_time_ms: 100.0,
            total_executions: total,
            successful_executions: successful,
            failed_executions: total - successful,
        }
    }

    fn pair() -> SwarmTopology {
        let edge = AgentConnection::new(
            AgentId::from("x"),
            AgentId::from("y"),
            ConnectionType::DelegatesTo,
            0.5,
            Utc::now(),
        );
        TopologyBuilder::new().build(&[edge]).remove(0)
    }

    #[test]
    fn test_sample_std_dev() {
        assert_eq!(sample_std_dev(&[50.0]), 0.0);
        assert!((sample_std_dev(&[80.0, 100.0]) - 200f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_effectiveness_formula() {
        let topology = pair();
        // pair x -> y: pipeline 1.0 dominates, mean strength 0.5
        let performance = PerformanceScorer::new().score(&topology, &[summary("x", 100.0, 10), summary("y", 100.0, 4)]);

        assert_eq!(performance.total_executions, 14);
        assert!((performance.coordination_effectiveness - (0.4 + 0.4 * 0.5 + 0.2 * 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_divergent_members_score_lower() {
        let topology = pair();
        let scorer = PerformanceScorer::new();
        let even = scorer.score(&topology, &[summary("x", 90.0, 10), summary("y", 90.0, 10)]);
        let uneven = scorer.score(&topology, &[summary("x", 100.0, 10), summary("y", 20.0, 10)]);
        assert!(uneven.coordination_effectiveness < even.coordination_effectiveness);
    }

    #[test]
    fn test_needs_two_members_with_data() {
        let performance = PerformanceScorer::new().score(&pair(), &[summary("x", 100.0, 3)]);
        assert_eq!(performance.coordination_effectiveness, 0.0);
        assert_eq!(performance.members_with_data, 1);
        assert_eq!(performance.total_executions, 3);
    }
}
