// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::application::lifecycle::AgentRuntime;
use crate::domain::agent::{AgentBlueprint, AgentError, AgentId, AgentState};

pub fn app(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/agents", post(create_agent).get(list_agents))
        .route("/api/agents/{id}", get(get_agent).delete(delete_agent))
        .route("/api/agents/{id}/initialize", post(initialize_agent))
        .route("/api/agents/{id}/state", put(set_agent_state))
        .route("/api/agents/{id}/logs", get(get_logs))
        .route("/webhooks/{*path}", any(webhook))
        .with_state(runtime)
}

/// `AgentError` rendered as `{"error": ...}` with a matching status code.
pub struct ApiError(AgentError);

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AgentError::UnknownTool(_)
            | AgentError::UnknownStrategy(_)
            | AgentError::InvalidToolConfig { .. }
            | AgentError::InvalidStrategyConfig { .. }
            | AgentError::InvalidTrigger(_) => StatusCode::BAD_REQUEST,
            AgentError::AgentNotFound(_) => StatusCode::NOT_FOUND,
            AgentError::DuplicateAgentId(_)
            | AgentError::DuplicateWebhookPath(_)
            | AgentError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            AgentError::StrategyInitialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn health(State(runtime): State<Arc<AgentRuntime>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "agents": runtime.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub blueprint: AgentBlueprint,
}

async fn create_agent(
    State(runtime): State<Arc<AgentRuntime>>,
    Json(request): Json<CreateAgentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let agent = runtime.create_agent(
        AgentId::from(request.id),
        request.name,
        request.description,
        request.blueprint,
    )?;
    Ok((StatusCode::CREATED, Json(agent.summary())))
}

async fn list_agents(State(runtime): State<Arc<AgentRuntime>>) -> impl IntoResponse {
    Json(runtime.list_agents())
}

async fn get_agent(
    State(runtime): State<Arc<AgentRuntime>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(runtime.get_agent(&AgentId::from(id))?))
}

async fn delete_agent(
    State(runtime): State<Arc<AgentRuntime>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    runtime.delete_agent(&AgentId::from(id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn initialize_agent(
    State(runtime): State<Arc<AgentRuntime>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = AgentId::from(id);
    runtime.initialize(&id).await?;
    Ok(Json(runtime.get_agent(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct SetStateRequest {
    pub state: AgentState,
}

async fn set_agent_state(
    State(runtime): State<Arc<AgentRuntime>>,
    Path(id): Path<String>,
    Json(request): Json<SetStateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = AgentId::from(id);
    runtime.set_agent_state(&id, request.state).await?;
    Ok(Json(runtime.get_agent(&id)?))
}

async fn get_logs(
    State(runtime): State<Arc<AgentRuntime>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = runtime.get_logs(&AgentId::from(id)).await?;
    Ok(Json(json!({ "logs": logs })))
}

async fn webhook(
    State(runtime): State<Arc<AgentRuntime>>,
    Path(path): Path<String>,
    method: Method,
    body: Bytes,
) -> Response {
    let Some(route) = runtime.resolve_webhook(&path) else {
        return error_response(StatusCode::NOT_FOUND, format!("No webhook registered at /{}", path));
    };

    if !method.as_str().eq_ignore_ascii_case(&route.method) {
        return error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Webhook /{} accepts {}", path, route.method),
        );
    }

    let agent = match runtime.agent(&route.agent_id) {
        Ok(agent) => agent,
        Err(e) => return ApiError(e).into_response(),
    };

    // The route flag trails the agent's state during a transition; both must
    // agree before a run is accepted.
    if !route.armed || agent.state() != AgentState::Running {
        return error_response(
            StatusCode::CONFLICT,
            format!("Agent '{}' is not RUNNING", route.agent_id),
        );
    }

    let input = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path, "Rejected webhook body: {}", e);
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e));
            }
        }
    };

    debug!(path = %path, agent_id = %route.agent_id, "Webhook invoked");
    match runtime.run(&route.agent_id, input).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
