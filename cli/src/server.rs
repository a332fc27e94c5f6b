// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Host process wiring
//!
//! Builds the agent runtime and the swarm coordination service over shared
//! in-memory stores, then serves the core agent router merged with the swarm
//! endpoints.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use colony_core::domain::node_config::{MetricsConfig, NodeConfigManifest};
use colony_core::infrastructure::{
    builtin_capabilities, EventBus, EventBusError, ExecutionPerformanceAnalytics,
    InMemoryExecutionRepository,
};
use colony_core::{application::lifecycle::AgentRuntime, presentation::api};
use colony_swarm::application::{
    SwarmAnalysisConfig, SwarmAnalysisTask, SwarmCoordinationService, SwarmService,
};
use colony_swarm::infrastructure::InMemoryConnectionRepository;

/// Every long-lived service of one host process.
pub struct Host {
    pub runtime: Arc<AgentRuntime>,
    pub executions: Arc<InMemoryExecutionRepository>,
    pub connections: Arc<InMemoryConnectionRepository>,
    pub swarms: Arc<SwarmCoordinationService>,
    pub event_bus: EventBus,
}

impl Host {
    pub fn new() -> Result<Self> {
        let capabilities =
            Arc::new(builtin_capabilities().context("Failed to build capability registries")?);
        let executions = Arc::new(InMemoryExecutionRepository::new());
        let connections = Arc::new(InMemoryConnectionRepository::new());
        let event_bus = EventBus::with_default_capacity();

        let runtime = Arc::new(AgentRuntime::new(
            capabilities,
            executions.clone(),
            event_bus.clone(),
        ));
        let analytics = Arc::new(ExecutionPerformanceAnalytics::new(executions.clone()));
        let swarms = Arc::new(SwarmCoordinationService::new(
            executions.clone(),
            connections.clone(),
            analytics,
        ));

        Ok(Self {
            runtime,
            executions,
            connections,
            swarms,
            event_bus,
        })
    }

    /// Core agent routes plus `/api/swarms`.
    pub fn router(&self, default_window_hours: u32) -> Router {
        let swarm_state = SwarmState {
            service: self.swarms.clone(),
            default_window_hours,
        };

        api::app(self.runtime.clone())
            .merge(swarm_routes(swarm_state))
            .layer(TraceLayer::new_for_http())
    }
}

#[derive(Clone)]
struct SwarmState {
    service: Arc<dyn SwarmService>,
    default_window_hours: u32,
}

fn swarm_routes(state: SwarmState) -> Router {
    Router::new()
        .route("/api/swarms", get(current_swarms))
        .route("/api/swarms/analyze", post(analyze_swarms))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    window_hours: Option<u32>,
}

async fn current_swarms(State(state): State<SwarmState>) -> Response {
    let swarms = state.service.get_current_swarm_topology().await;
    Json(swarms).into_response()
}

async fn analyze_swarms(State(state): State<SwarmState>, body: Bytes) -> Response {
    let request = if body.is_empty() {
        AnalyzeRequest::default()
    } else {
        match serde_json::from_slice::<AnalyzeRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("Invalid request body: {}", e) })),
                )
                    .into_response()
            }
        }
    };

    let window_hours = request.window_hours.unwrap_or(state.default_window_hours);
    if window_hours == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "window_hours must be at least 1" })),
        )
            .into_response();
    }

    let swarms = state.service.update_swarm_coordination(window_hours).await;
    Json(swarms).into_response()
}

/// Run the host until Ctrl+C or SIGTERM.
pub async fn run(config: NodeConfigManifest) -> Result<()> {
    info!(node = %config.metadata.name, "Colony host starting");

    let network = &config.spec.network;
    let swarm = &config.spec.swarm;

    install_metrics_exporter(&network.bind_address, &config.spec.observability.metrics)?;

    let host = Host::new()?;
    let shutdown = CancellationToken::new();

    spawn_event_logger(&host.event_bus, shutdown.clone());

    let analysis = Arc::new(SwarmAnalysisTask::new(
        host.swarms.clone(),
        SwarmAnalysisConfig {
            enabled: swarm.enabled,
            window_hours: swarm.analysis_window_hours,
            interval_seconds: swarm.analysis_interval_seconds,
        },
    ));
    let analysis_token = analysis.shutdown_token();
    let analysis_handle = analysis.start();

    let app = host.router(swarm.analysis_window_hours);

    let addr = format!("{}:{}", network.bind_address, network.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Host shutting down");
    shutdown.cancel();
    analysis_token.cancel();
    if let Err(e) = analysis_handle.await {
        warn!("Swarm analysis task ended abnormally: {}", e);
    }

    Ok(())
}

fn install_metrics_exporter(bind_address: &str, metrics: &MetricsConfig) -> Result<()> {
    if !metrics.enabled {
        debug!("Metrics exporter disabled");
        return Ok(());
    }

    let addr: SocketAddr = format!("{}:{}", bind_address, metrics.port)
        .parse()
        .with_context(|| format!("Invalid metrics address {}:{}", bind_address, metrics.port))?;

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

/// Mirror lifecycle events into the log until `shutdown` fires.
fn spawn_event_logger(event_bus: &EventBus, shutdown: CancellationToken) {
    let mut receiver = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Ok(event) => debug!(agent_id = %event.agent_id(), ?event, "Lifecycle event"),
                    Err(EventBusError::Lagged(_)) => continue,
                    Err(_) => break,
                },
                _ = shutdown.cancelled() => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
