// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Swarm Coordination Service
//!
//! Runs the detector → builder → scorer pipeline over the execution log and
//! persists the connections it finds.
//!
//! Analysis failures never propagate: a store error is logged and the pass
//! yields no swarms, so the agent runtime keeps running regardless.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use colony_core::domain::analytics::PerformanceAnalytics;
use colony_core::domain::repository::{ExecutionRepository, RepositoryError};
use parking_lot::RwLock;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::detector::InteractionDetector;
use crate::application::scorer::PerformanceScorer;
use crate::application::topology_builder::TopologyBuilder;
use crate::domain::connection::{AgentConnection, ConnectionRepository};
use crate::domain::topology::SwarmTopology;

#[async_trait]
pub trait SwarmService: Send + Sync {
    /// Analyse the last `window_hours` of completed runs and return the
    /// resulting swarms.
    async fn update_swarm_coordination(&self, window_hours: u32) -> Vec<SwarmTopology>;

    /// Swarms implied by the currently active persisted connections.
    async fn get_current_swarm_topology(&self) -> Vec<SwarmTopology>;
}

pub struct SwarmCoordinationService {
    executions: Arc<dyn ExecutionRepository>,
    connections: Arc<dyn ConnectionRepository>,
    analytics: Arc<dyn PerformanceAnalytics>,
    detector: InteractionDetector,
    builder: TopologyBuilder,
    scorer: PerformanceScorer,
    last_analysis: RwLock<Option<(DateTime<Utc>, Vec<SwarmTopology>)>>,
}

impl SwarmCoordinationService {
    pub fn new(
        executions: Arc<dyn ExecutionRepository>,
        connections: Arc<dyn ConnectionRepository>,
        analytics: Arc<dyn PerformanceAnalytics>,
    ) -> Self {
        Self {
            executions,
            connections,
            analytics,
            detector: InteractionDetector::new(),
            builder: TopologyBuilder::new(),
            scorer: PerformanceScorer::new(),
            last_analysis: RwLock::new(None),
        }
    }

    /// Result of the most recent successful `update_swarm_coordination`.
    pub fn last_analysis(&self) -> Option<(DateTime<Utc>, Vec<SwarmTopology>)> {
        self.last_analysis.read().clone()
    }

    async fn analyse(&self, window_hours: u32) -> Result<Vec<SwarmTopology>, RepositoryError> {
        // Windows reaching past the representable range cover the whole log
        let since = chrono::Duration::try_hours(i64::from(window_hours))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let records = self.executions.find_completed_since(since).await?;
        debug!(records = records.len(), window_hours, "Analysing execution window");

        let detected = self.detector.detect(&records);
        for connection in &detected {
            self.connections.upsert(connection).await?;
        }
        metrics::gauge!("colony_swarm_connections_detected").set(detected.len() as f64);

        let current: Vec<_> = detected.iter().map(AgentConnection::key).collect();
        let retired = self.connections.deactivate_except(&current).await?;
        if retired > 0 {
            debug!(retired, "Deactivated connections absent from this pass");
        }

        self.topologies(&detected).await
    }

    async fn topologies(&self, connections: &[AgentConnection]) -> Result<Vec<SwarmTopology>, RepositoryError> {
        let mut swarms = self.builder.build(connections);
        for swarm in &mut swarms {
            let mut summaries = Vec::with_capacity(swarm.members.len());
            for member in &swarm.members {
                if let Some(summary) = self.analytics.performance(member).await? {
                    summaries.push(summary);
                }
            }
            swarm.performance = Some(self.scorer.score(swarm, &summaries));
        }
        Ok(swarms)
    }
}

#[async_trait]
impl SwarmService for SwarmCoordinationService {
    async fn update_swarm_coordination(&self, window_hours: u32) -> Vec<SwarmTopology> {
        match self.analyse(window_hours).await {
            Ok(swarms) => {
                info!(swarms = swarms.len(), window_hours, "Swarm coordination updated");
                metrics::gauge!("colony_swarms_active").set(swarms.len() as f64);
                *self.last_analysis.write() = Some((Utc::now(), swarms.clone()));
                swarms
            }
            Err(e) => {
                error!("Swarm coordination analysis failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn get_current_swarm_topology(&self) -> Vec<SwarmTopology> {
        let active = match self.connections.list_active().await {
            Ok(active) => active,
            Err(e) => {
                error!("Failed to load active connections: {}", e);
                return Vec::new();
            }
        };

        match self.topologies(&active).await {
            Ok(swarms) => swarms,
            Err(e) => {
                error!("Failed to score current swarms: {}", e);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SwarmAnalysisConfig {
    pub enabled: bool,
    pub window_hours: u32,
    pub interval_seconds: u64,
}

impl Default for SwarmAnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_hours: 24,
            interval_seconds: 300,
        }
    }
}

/// Background task re-running the analysis on a fixed interval.
pub struct SwarmAnalysisTask {
    service: Arc<dyn SwarmService>,
    config: SwarmAnalysisConfig,
    shutdown_token: CancellationToken,
}

impl SwarmAnalysisTask {
    pub fn new(service: Arc<dyn SwarmService>, config: SwarmAnalysisConfig) -> Self {
        Self {
            service,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        if !self.config.enabled {
            info!("Swarm analysis is disabled");
            return;
        }

        info!(
            interval_seconds = self.config.interval_seconds,
            window_hours = self.config.window_hours,
            "Starting swarm analysis background task"
        );

        let mut tick = interval(Duration::from_secs(self.config.interval_seconds.max(1)));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let swarms = self.service.update_swarm_coordination(self.config.window_hours).await;
                    debug!(swarms = swarms.len(), "Swarm analysis cycle finished");
                }
                _ = self.shutdown_token.cancelled() => {
                    warn!("Swarm analysis shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService(AtomicUsize);

    #[async_trait]
    impl SwarmService for CountingService {
        async fn update_swarm_coordination(&self, _window_hours: u32) -> Vec<SwarmTopology> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }

        async fn get_current_swarm_topology(&self) -> Vec<SwarmTopology> {
            Vec::new()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_task_ticks_until_cancelled() {
        let service = Arc::new(CountingService(AtomicUsize::new(0)));
        let task = Arc::new(SwarmAnalysisTask::new(
            service.clone(),
            SwarmAnalysisConfig {
                enabled: true,
                window_hours: 24,
                interval_seconds: 60,
            },
        ));
        let token = task.shutdown_token();
        let handle = task.start();

        // First tick fires immediately, then at 60s and 120s
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(service.0.load(Ordering::SeqCst), 3);

        token.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(service.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_disabled_task_returns_immediately() {
        let service = Arc::new(CountingService(AtomicUsize::new(0)));
        let task = Arc::new(SwarmAnalysisTask::new(
            service.clone(),
            SwarmAnalysisConfig {
                enabled: false,
                ..SwarmAnalysisConfig::default()
            },
        ));
        task.start().await.unwrap();
        assert_eq!(service.0.load(Ordering::SeqCst), 0);
    }
}
