// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Interaction Detector
//!
//! Infers directed edges between agents from the timing of their completed
//! runs: when B repeatedly starts shortly after A finishes, A → B.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Purpose:** Turn an execution-log window into `AgentConnection`s
//!
//! The pairwise scan is quadratic in the number of records per agent pair,
//! which is fine for the fleet sizes a single host runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use colony_core::domain::agent::AgentId;
use colony_core::domain::execution::ExecutionRecord;
use tracing::debug;

use crate::domain::connection::{AgentConnection, ConnectionType};

/// B must start within this long after A ends to count as an occurrence.
pub const MAX_FOLLOW_DELAY_MINUTES: i64 = 10;
/// Pairs whose mean delay exceeds this are discarded.
pub const MAX_MEAN_DELAY_MINUTES: f64 = 5.0;
pub const MIN_OCCURRENCES: usize = 2;

/// Coarse tool classification used by the connection-type heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    LanguageModel,
    Extraction,
    Publishing,
    Other,
}

impl ToolCategory {
    pub fn of(tool_name: &str) -> Self {
        let name = tool_name.to_ascii_lowercase();
        let has_any = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has_any(&["llm", "chat", "gpt", "gemini", "claude"]) {
            ToolCategory::LanguageModel
        } else if has_any(&["scrape", "extract", "fetch", "http_get"]) {
            ToolCategory::Extraction
        } else if has_any(&["post", "publish", "blog", "tweet"]) {
            ToolCategory::Publishing
        } else {
            ToolCategory::Other
        }
    }
}

/// `min(1, min(0.7, n/10) + timing)`, timing stepping down with the mean delay.
pub fn connection_strength(occurrences: usize, mean_delay_minutes: f64) -> f64 {
    let frequency = (occurrences as f64 / 10.0).min(0.7);
    let timing = if mean_delay_minutes <= 0.5 {
        0.3
    } else if mean_delay_minutes <= 2.0 {
        0.2
    } else if mean_delay_minutes <= 5.0 {
        0.1
    } else {
        0.0
    };
    (frequency + timing).min(1.0)
}

#[derive(Debug, Default)]
struct PairEvidence {
    occurrences: usize,
    total_delay_ms: i64,
    last_interaction: Option<DateTime<Utc>>,
}

impl PairEvidence {
    fn mean_delay_minutes(&self) -> f64 {
        self.total_delay_ms as f64 / self.occurrences as f64 / 60_000.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct InteractionDetector;

impl InteractionDetector {
    pub fn new() -> Self {
        Self
    }

    /// Infer connections from completed `records`. Failed records are
    /// ignored. Output is ordered by `(source, target)`.
    pub fn detect(&self, records: &[ExecutionRecord]) -> Vec<AgentConnection> {
        let mut by_agent: BTreeMap<&AgentId, Vec<&ExecutionRecord>> = BTreeMap::new();
        for record in records.iter().filter(|r| r.is_completed()) {
            by_agent.entry(&record.agent_id).or_default().push(record);
        }

        let tools: BTreeMap<&AgentId, BTreeSet<&str>> = by_agent
            .iter()
            .map(|(id, runs)| {
                let names = runs.iter().flat_map(|r| r.tools_used.iter().map(String::as_str)).collect();
                (*id, names)
            })
            .collect();

        let window = Duration::minutes(MAX_FOLLOW_DELAY_MINUTES);
        let mut connections = Vec::new();

        for (source, source_runs) in &by_agent {
            for (target, target_runs) in &by_agent {
                if source == target {
                    continue;
                }

                let mut evidence = PairEvidence::default();
                for a in source_runs {
                    for b in target_runs {
                        let delay = b.started_at - a.ended_at;
                        if delay >= Duration::zero() && delay <= window {
                            evidence.occurrences += 1;
                            evidence.total_delay_ms += delay.num_milliseconds();
                            evidence.last_interaction = evidence.last_interaction.max(Some(b.started_at));
                        }
                    }
                }

                if evidence.occurrences < MIN_OCCURRENCES {
                    continue;
                }
                let mean_delay = evidence.mean_delay_minutes();
                if mean_delay > MAX_MEAN_DELAY_MINUTES {
                    continue;
                }

                let connection_type = classify(&tools[source], &tools[target], mean_delay);
                let strength = connection_strength(evidence.occurrences, mean_delay);
                debug!(
                    source = %source,
                    target = %target,
                    occurrences = evidence.occurrences,
                    mean_delay_minutes = mean_delay,
                    strength,
                    "Detected interaction"
                );

                connections.push(AgentConnection::new(
                    (*source).clone(),
                    (*target).clone(),
                    connection_type,
                    strength,
                    evidence.last_interaction.unwrap_or_else(Utc::now),
                ));
            }
        }

        connections
    }
}

fn classify(source_tools: &BTreeSet<&str>, target_tools: &BTreeSet<&str>, mean_delay_minutes: f64) -> ConnectionType {
    let source_uses = |category: ToolCategory| source_tools.iter().any(|t| ToolCategory::of(t) == category);
    let target_uses = |category: ToolCategory| target_tools.iter().any(|t| ToolCategory::of(t) == category);

    let target_uses_non_llm = target_tools
        .iter()
        .any(|t| ToolCategory::of(t) != ToolCategory::LanguageModel);

    if source_uses(ToolCategory::LanguageModel) && target_uses_non_llm {
        ConnectionType::DelegatesTo
    } else if source_uses(ToolCategory::Extraction) && target_uses(ToolCategory::Publishing) {
        ConnectionType::FeedsDataTo
    } else if mean_delay_minutes < 1.0 {
        ConnectionType::CoordinatesWith
    } else {
        ConnectionType::DelegatesTo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(agent: &str, start: DateTime<Utc>, secs: i64, tools: &[&str]) -> ExecutionRecord {
        ExecutionRecord::completed(
            AgentId::from(agent),
            start,
            start + Duration::seconds(secs),
            tools.iter().map(|t| t.to_string()).collect(),
        )
    }

    /// `count` runs of `a`, each followed by a run of `b` after `delay_secs`.
    fn chain(a: &str, b: &str, count: usize, delay_secs: i64, a_tools: &[&str], b_tools: &[&str]) -> Vec<ExecutionRecord> {
        let base = Utc::now() - Duration::hours(12);
        let mut records = Vec::new();
        for i in 0..count {
            let start = base + Duration::hours(i as i64);
            records.push(run(a, start, 30, a_tools));
            records.push(run(b, start + Duration::seconds(30 + delay_secs), 30, b_tools));
        }
        records
    }

    #[test]
    fn test_tool_categories() {
        assert_eq!(ToolCategory::of("llm_chat"), ToolCategory::LanguageModel);
        assert_eq!(ToolCategory::of("ClaudeSummarize"), ToolCategory::LanguageModel);
        assert_eq!(ToolCategory::of("web_scraper"), ToolCategory::Extraction);
        assert_eq!(ToolCategory::of("http_get"), ToolCategory::Extraction);
        assert_eq!(ToolCategory::of("tweet"), ToolCategory::Publishing);
        assert_eq!(ToolCategory::of("ping"), ToolCategory::Other);
    }

    #[test]
    fn test_strength_steps() {
        assert!((connection_strength(3, 2.0) - 0.5).abs() < 1e-9);
        assert!((connection_strength(2, 0.25) - 0.5).abs() < 1e-9);
        assert!((connection_strength(20, 0.1) - 1.0).abs() < 1e-9);
        assert!((connection_strength(4, 4.0) - 0.5).abs() < 1e-9);
        assert!((connection_strength(4, 6.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_strength_monotonic() {
        for delay in [0.1, 0.5, 1.0, 2.0, 3.0, 5.0, 7.0] {
            let mut previous = 0.0;
            for n in 0..20 {
                let s = connection_strength(n, delay);
                assert!(s >= previous, "count {} delay {}", n, delay);
                previous = s;
            }
        }
        for n in [1, 2, 5, 9, 15] {
            let mut previous = f64::MAX;
            for tenth in 0..80 {
                let s = connection_strength(n, tenth as f64 / 10.0);
                assert!(s <= previous, "count {} delay {}", n, tenth);
                previous = s;
            }
        }
    }

    #[test]
    fn test_two_minute_follow_three_times() {
        let records = chain("x", "y", 3, 120, &["ping"], &["ping"]);
        let connections = InteractionDetector::new().detect(&records);

        assert_eq!(connections.len(), 1);
        let c = &connections[0];
        assert_eq!((c.source.as_str(), c.target.as_str()), ("x", "y"));
        assert!((c.strength - 0.5).abs() < 1e-9);
        assert_eq!(c.connection_type, ConnectionType::DelegatesTo);
        assert!(c.active);
    }

    #[test]
    fn test_single_occurrence_is_not_enough() {
        let records = chain("x", "y", 1, 60, &[], &[]);
        assert!(InteractionDetector::new().detect(&records).is_empty());
    }

    #[test]
    fn test_slow_followers_are_discarded() {
        // 8 minute gap: inside the follow window, above the mean cutoff
        let records = chain("x", "y", 4, 480, &[], &[]);
        assert!(InteractionDetector::new().detect(&records).is_empty());
    }

    #[test]
    fn test_failed_runs_are_ignored() {
        let mut records = chain("x", "y", 3, 60, &[], &[]);
        for r in records.iter_mut().filter(|r| r.agent_id.as_str() == "y") {
            r.status = colony_core::domain::execution::ExecutionStatus::Failed;
        }
        assert!(InteractionDetector::new().detect(&records).is_empty());
    }

    #[test]
    fn test_connection_type_heuristics() {
        let detector = InteractionDetector::new();

        let c = &detector.detect(&chain("brain", "hands", 3, 120, &["llm_chat"], &["http_get"]))[0];
        assert_eq!(c.connection_type, ConnectionType::DelegatesTo);

        let c = &detector.detect(&chain("scraper", "blogger", 3, 120, &["web_scrape"], &["publish_post"]))[0];
        assert_eq!(c.connection_type, ConnectionType::FeedsDataTo);

        let c = &detector.detect(&chain("a", "b", 3, 20, &["ping"], &["ping"]))[0];
        assert_eq!(c.connection_type, ConnectionType::CoordinatesWith);

        // An LLM agent followed only by another LLM agent is not delegation
        // by tool evidence; timing decides
        let c = &detector.detect(&chain("gpt1", "gpt2", 3, 20, &["gpt"], &["chat"]))[0];
        assert_eq!(c.connection_type, ConnectionType::CoordinatesWith);
    }
}
