// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tests for the composed host router: agent routes and swarm routes on
//! one service, sharing the execution log.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use colony::server::Host;
use colony_core::domain::agent::AgentId;
use colony_core::domain::execution::ExecutionRecord;
use colony_core::domain::repository::ExecutionRepository;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed_follower_pair(host: &Host) {
    let base = Utc::now() - Duration::hours(6);
    for i in 0..3 {
        let start = base + Duration::hours(i);
        let leader = ExecutionRecord::completed(
            AgentId::from("collector"),
            start,
            start + Duration::seconds(30),
            vec!["web_scrape".to_string()],
        );
        let follower_start = start + Duration::minutes(2);
        let follower = ExecutionRecord::completed(
            AgentId::from("writer"),
            follower_start,
            follower_start + Duration::seconds(30),
            vec!["publish_post".to_string()],
        );
        host.executions.save(&leader).await.unwrap();
        host.executions.save(&follower).await.unwrap();
    }
}

#[tokio::test]
async fn test_agent_routes_are_served() {
    let host = Host::new().unwrap();
    let app = host.router(24);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agents"], 0);

    let (status, body) = send(
        &app,
        "POST",
        "/api/agents",
        Some(json!({
            "id": "pinger",
            "name": "Pinger",
            "blueprint": {
                "tools": [{"name": "ping", "config": {}}],
                "strategy": {"name": "sequential", "config": {}},
                "trigger": {"type": "webhook", "params": {}}
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(host.runtime.len(), 1);
}

#[tokio::test]
async fn test_analyze_then_current_topology() {
    let host = Host::new().unwrap();
    seed_follower_pair(&host).await;
    let app = host.router(24);

    let (status, body) = send(&app, "POST", "/api/swarms/analyze", Some(json!({"window_hours": 12}))).await;
    assert_eq!(status, StatusCode::OK);
    let swarms = body.as_array().unwrap();
    assert_eq!(swarms.len(), 1);
    assert_eq!(swarms[0]["members"], json!(["collector", "writer"]));
    assert_eq!(swarms[0]["connections"][0]["connection_type"], "feeds_data_to");

    let (status, body) = send(&app, "GET", "/api/swarms", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(host.connections.all().len(), 1);
}

#[tokio::test]
async fn test_analyze_request_validation() {
    let host = Host::new().unwrap();
    seed_follower_pair(&host).await;
    let app = host.router(24);

    // Empty body falls back to the configured window
    let (status, body) = send(&app, "POST", "/api/swarms/analyze", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "POST", "/api/swarms/analyze", Some(json!({"window_hours": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/swarms/analyze", Some(json!({"window_hours": "soon"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_short_window_finds_nothing() {
    let host = Host::new().unwrap();
    seed_follower_pair(&host).await;
    let app = host.router(24);

    let (status, body) = send(&app, "POST", "/api/swarms/analyze", Some(json!({"window_hours": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(&app, "GET", "/api/swarms", None).await;
    assert_eq!(body, json!([]));
}
